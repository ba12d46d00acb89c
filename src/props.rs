use std::collections::HashMap;

use crate::client::IltApi;
use crate::error::IltError;

/// One physical property known to ILThermo: the short abbreviation used on
/// the command line, the hash key used in the search request, and the long
/// display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub abbr: &'static str,
    pub key: &'static str,
    pub name: &'static str,
}

/// Properties shipped with the crate, as last observed on the server.
/// The hash keys have changed before; `PropertyCatalog::fetch` refreshes
/// them from the live property list.
pub const PROPERTIES: &[Property] = &[
    Property { abbr: "Dself", key: "wCtj", name: "Self-diffusion coefficient" },
    Property { abbr: "Dterm", key: "LZlp", name: "Thermal diffusivity" },
    Property { abbr: "Dtrac", key: "QJLO", name: "Tracer diffusion coefficient" },
    Property { abbr: "H", key: "wRMb", name: "Enthalpy" },
    Property { abbr: "Hap", key: "KuRZ", name: "Apparent enthalpy" },
    Property { abbr: "Hc", key: "TZRG", name: "Henry's Law constant" },
    Property { abbr: "Hdil", key: "uChD", name: "Enthalpy of dilution" },
    Property { abbr: "Hex", key: "nYML", name: "Excess enthalpy" },
    Property { abbr: "Hfus", key: "Exvj", name: "Enthalpy of transition or fusion" },
    Property { abbr: "Hmix", key: "Xndy", name: "Enthalpy of mixing of a binary solvent with component" },
    Property { abbr: "Hpm", key: "hrKG", name: "Partial molar enthalpy" },
    Property { abbr: "HvT", key: "jSGu", name: "Enthalpy function {H(T)-H(0)}/T" },
    Property { abbr: "Hvap", key: "ftHP", name: "Enthalpy of vaporization or sublimation" },
    Property { abbr: "L", key: "IvMf", name: "Ostwald coefficient" },
    Property { abbr: "Pc", key: "Msbg", name: "Critical pressure" },
    Property { abbr: "Peq", key: "qhbo", name: "Equilibrium pressure" },
    Property { abbr: "Pucon", key: "fGxt", name: "Upper consolute pressure" },
    Property { abbr: "S", key: "yfIP", name: "Entropy" },
    Property { abbr: "Tb", key: "mfvC", name: "Normal boiling temperature" },
    Property { abbr: "Tc", key: "nOoz", name: "Critical temperature" },
    Property { abbr: "Tcond", key: "MYsr", name: "Thermal conductivity" },
    Property { abbr: "Teq", key: "CkHK", name: "Equilibrium temperature" },
    Property { abbr: "Teut", key: "DFpj", name: "Eutectic temperature" },
    Property { abbr: "Tm", key: "kZMO", name: "Normal melting temperature" },
    Property { abbr: "Tmot", key: "xNNb", name: "Monotectic temperature" },
    Property { abbr: "Tucon", key: "THUU", name: "Upper consolute temperature" },
    Property { abbr: "Vapm", key: "aBBm", name: "Apparent molar volume" },
    Property { abbr: "Vex", key: "ksvJ", name: "Excess volume" },
    Property { abbr: "Vpm", key: "jSTk", name: "Partial molar volume" },
    Property { abbr: "Xeut", key: "QRlf", name: "Eutectic composition" },
    Property { abbr: "Xpeq", key: "Fptx", name: "Composition at phase equilibrium" },
    Property { abbr: "Xucon", key: "zThS", name: "Upper consolute composition" },
    Property { abbr: "a", key: "GIOY", name: "Activity" },
    Property { abbr: "aV", key: "qNxb", name: "Isobaric coefficient of volume expansion" },
    Property { abbr: "capm", key: "YpPw", name: "Apparent molar heat capacity" },
    Property { abbr: "cp", key: "tYhZ", name: "Heat capacity at constant pressure" },
    Property { abbr: "cpe", key: "LiNC", name: "Heat capacity at vapor saturation pressure" },
    Property { abbr: "cv", key: "VRCC", name: "Heat capacity at constant volume" },
    Property { abbr: "dens", key: "VehR", name: "Density" },
    Property { abbr: "econd", key: "fnRH", name: "Electrical conductivity" },
    Property { abbr: "kS", key: "EQiy", name: "Adiabatic compressibility" },
    Property { abbr: "kT", key: "waKp", name: "Isothermal compressibility" },
    Property { abbr: "n", key: "Agpv", name: "Refractive index" },
    Property { abbr: "phi", key: "FXOy", name: "Osmotic coefficient" },
    Property { abbr: "rperm", key: "YSLP", name: "Relative permittivity" },
    Property { abbr: "s", key: "sxQZ", name: "Interfacial tension" },
    Property { abbr: "slg", key: "exok", name: "Surface tension liquid-gas" },
    Property { abbr: "sos", key: "Gjrc", name: "Speed of sound" },
    Property { abbr: "tline", key: "IwRh", name: "Tieline" },
    Property { abbr: "visc", key: "AJfy", name: "Viscosity" },
];

pub fn find_by_abbr(abbr: &str) -> Option<&'static Property> {
    PROPERTIES.iter().find(|prop| prop.abbr == abbr)
}

pub fn abbr_for_name(name: &str) -> Option<&'static str> {
    PROPERTIES
        .iter()
        .find(|prop| prop.name == name)
        .map(|prop| prop.abbr)
}

/// Abbreviation → search-key lookup used by `query`.
///
/// Constructed explicitly, either from the built-in table or by an explicit
/// refresh against the server's property list. There is no hidden global and
/// no on-first-use network call; callers decide when (and whether) to pay for
/// the refresh.
#[derive(Debug, Clone)]
pub struct PropertyCatalog {
    keys: HashMap<&'static str, String>,
}

impl PropertyCatalog {
    /// Catalog backed by the compiled-in search keys.
    pub fn builtin() -> Self {
        let keys = PROPERTIES
            .iter()
            .map(|prop| (prop.abbr, prop.key.to_string()))
            .collect();
        Self { keys }
    }

    /// Catalog with search keys refreshed from the server's property list.
    /// Properties the server reports but this crate does not know by name are
    /// skipped; properties the server dropped fall back to the built-in key.
    pub fn fetch(api: &dyn IltApi) -> Result<Self, IltError> {
        let mut catalog = Self::builtin();
        let list = api.property_list()?;
        for class in &list.plist {
            for (name, key) in class.name.iter().zip(class.key.iter()) {
                match abbr_for_name(name.trim()) {
                    Some(abbr) => {
                        catalog.keys.insert(abbr, key.clone());
                    }
                    None => {
                        tracing::debug!(property = %name.trim(), "unknown property in server list");
                    }
                }
            }
        }
        Ok(catalog)
    }

    /// Search-request key for a property abbreviation.
    pub fn search_key(&self, abbr: &str) -> Result<&str, IltError> {
        self.keys
            .get(abbr)
            .map(String::as_str)
            .ok_or_else(|| IltError::UnknownProperty(abbr.to_string()))
    }

    /// Known abbreviations in sorted order (for the `--props` table).
    pub fn abbreviations(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.keys.keys().copied().collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builtin_lookup() {
        let catalog = PropertyCatalog::builtin();
        assert_eq!(catalog.search_key("dens").unwrap(), "VehR");
        assert_eq!(catalog.search_key("visc").unwrap(), "AJfy");
    }

    #[test]
    fn unknown_abbreviation() {
        let catalog = PropertyCatalog::builtin();
        let err = catalog.search_key("bogus").unwrap_err();
        assert_matches!(err, IltError::UnknownProperty(_));
    }

    #[test]
    fn name_abbr_round_trip() {
        for prop in PROPERTIES {
            assert_eq!(abbr_for_name(prop.name), Some(prop.abbr));
            assert_eq!(find_by_abbr(prop.abbr).unwrap().name, prop.name);
        }
    }
}
