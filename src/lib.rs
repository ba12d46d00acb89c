//! Client library for the Ionic Liquids Database - ILThermo (v2.0) from NIST
//! (Standard Reference Database #147).
//!
//! [`search::query`] runs a search against the ILThermo web service and
//! decodes the JSON response into a [`search::SearchResult`], one
//! [`search::RefRecord`] per hit. A record's full measurement table is
//! fetched on demand with [`search::RefRecord::retrieve`], which reshapes
//! the server's irregular nested arrays into a dense
//! [`dataset::DataMatrix`] with aligned per-column metadata (description,
//! physical property, unit, phase); width-2 value groups expand into an
//! extra `Delta(prev)` uncertainty column.
//!
//! The `ilt2report` binary builds a search-and-report tool on top: it prints
//! the hit table, fetches every data set, and writes a report directory with
//! one data file per reference (see [`report`]).

pub mod client;
pub mod dataset;
pub mod doi;
pub mod domain;
pub mod error;
pub mod props;
pub mod report;
pub mod search;
