use assert_matches::assert_matches;
use serde_json::json;

use ilthermo::client::RawSetResponse;
use ilthermo::dataset::Dataset;
use ilthermo::domain::SetId;
use ilthermo::error::IltError;

fn setid() -> SetId {
    "abcDE".parse().unwrap()
}

fn raw(value: serde_json::Value) -> RawSetResponse {
    serde_json::from_value(value).unwrap()
}

#[test]
fn delta_column_sits_right_after_its_value() {
    // Four source columns, only the third carries value+delta pairs.
    let dataset = Dataset::from_raw(
        setid(),
        raw(json!({
            "dhead": [
                ["Temperature, K"],
                ["Pressure, kPa"],
                ["Viscosity, Pa&#8226;s", "Liquid"],
                ["Mole fraction of water", "Liquid"]
            ],
            "data": [
                [["298.15"], ["101.3"], ["0.021", "0.001"], ["0.25"]],
                [["308.15"], ["101.3"], ["0.015", "0.001"], ["0.25"]]
            ],
            "components": [{"name": "water"}],
            "title": "Binary system: Viscosity",
            "phases": ["Liquid"]
        })),
    )
    .unwrap();

    assert_eq!(dataset.shape(), (2, 5));
    let descriptions = dataset.column_descriptions();
    assert_eq!(
        descriptions,
        vec![
            "Temperature/K",
            "Pressure/kPa",
            "Viscosity[Liquid]/Pa&#8226;s",
            "Delta(prev)",
            "Mole_fraction_of_water[Liquid]"
        ]
    );
    assert_eq!(
        descriptions.iter().filter(|d| **d == "Delta(prev)").count(),
        1
    );
    assert_eq!(dataset.column_properties()[3], "Delta[Viscosity]");
    assert_eq!(dataset.column_phases()[3], Some("Liquid"));

    // The delta values land between the viscosity and mole-fraction columns.
    assert_eq!(dataset.matrix().row(0), &[298.15, 101.3, 0.021, 0.001, 0.25]);
}

#[test]
fn column_metadata_always_matches_matrix_width() {
    let payloads = [
        json!({
            "dhead": [["Temperature, K"]],
            "data": [[["298.15"]]],
            "components": [],
            "title": "",
            "phases": []
        }),
        json!({
            "dhead": [["Temperature, K"], ["Pressure, kPa"]],
            "data": [
                [["298.15", "0.1"], ["101.3", "0.5"]],
                [["308.15", "0.1"], ["101.3", "0.5"]]
            ],
            "components": [],
            "title": "",
            "phases": []
        }),
        json!({
            "dhead": [["Temperature, K"], ["Pressure, kPa"]],
            "data": [],
            "components": [],
            "title": "",
            "phases": []
        }),
    ];
    for payload in payloads {
        let dataset = Dataset::from_raw(setid(), raw(payload)).unwrap();
        assert_eq!(dataset.columns().len(), dataset.matrix().cols());
        assert_eq!(
            dataset.column_descriptions().len(),
            dataset.column_units().len()
        );
    }
}

#[test]
fn row_diverging_from_first_row_schema_fails() {
    let err = Dataset::from_raw(
        setid(),
        raw(json!({
            "dhead": [["Temperature, K"], ["Viscosity, Pa&#8226;s", "Liquid"]],
            "data": [
                [["298.15"], ["0.021", "0.001"]],
                [["308.15"], ["0.015"]]
            ],
            "components": [],
            "title": "",
            "phases": []
        })),
    )
    .unwrap_err();
    assert_matches!(
        err,
        IltError::ShapeMismatch {
            row: 1,
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn row_with_extra_group_fails() {
    let err = Dataset::from_raw(
        setid(),
        raw(json!({
            "dhead": [["Temperature, K"]],
            "data": [
                [["298.15"]],
                [["308.15"], ["1.0"]]
            ],
            "components": [],
            "title": "",
            "phases": []
        })),
    )
    .unwrap_err();
    assert_matches!(
        err,
        IltError::ShapeMismatch {
            row: 1,
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn mixed_numbers_and_numeric_strings_decode() {
    let dataset = Dataset::from_raw(
        setid(),
        raw(json!({
            "dhead": [["Temperature, K"], ["Pressure, kPa"]],
            "data": [[[298.15], ["101.3"]]],
            "components": [],
            "title": "",
            "phases": []
        })),
    )
    .unwrap();
    assert_eq!(dataset.matrix().get(0, 0), Some(298.15));
    assert_eq!(dataset.matrix().get(0, 1), Some(101.3));
}

#[test]
fn non_numeric_cell_fails_decoding() {
    let err = Dataset::from_raw(
        setid(),
        raw(json!({
            "dhead": [["Temperature, K"]],
            "data": [[["n/a"]]],
            "components": [],
            "title": "",
            "phases": []
        })),
    )
    .unwrap_err();
    assert_matches!(err, IltError::Decode(_));
}
