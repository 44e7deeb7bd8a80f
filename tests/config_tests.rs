use clap::{CommandFactory, FromArgMatches, Parser};
use rstest::rstest;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use tiforge::config::{EnumerationPolicy, RawConfig, GREY_MATTER_TAG};
use tiforge::error::ConfigError;

fn valid_raw() -> RawConfig {
    RawConfig {
        plus1: "E1, E2".to_string(),
        minus1: "E3".to_string(),
        plus2: "E4 E5".to_string(),
        minus2: "E6".to_string(),
        total_current: 2.0,
        current_step: 0.1,
        ..Default::default()
    }
}

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: RawConfig,
}

#[test]
fn test_resolve_valid_config() {
    let config = valid_raw().resolve().expect("valid config");
    assert_eq!(config.policy, EnumerationPolicy::Bucketed);
    assert_eq!(config.pools.plus1, vec!["E1", "E2"]);
    assert_eq!(config.pools.plus2, vec!["E4", "E5"]);
    assert_eq!(config.channel_limit, None);
    assert_eq!(config.pools.all_names().len(), 6);
}

#[rstest]
#[case("1E")]
#[case("E_1")]
#[case("E-1")]
#[case("É1")]
fn test_invalid_electrode_name(#[case] name: &str) {
    let raw = RawConfig {
        minus1: format!("E3,{}", name),
        ..valid_raw()
    };
    assert_eq!(
        raw.resolve(),
        Err(ConfigError::InvalidElectrode(name.to_string()))
    );
}

#[test]
fn test_empty_pool_is_rejected() {
    let raw = RawConfig {
        plus2: " , ".to_string(),
        ..valid_raw()
    };
    assert_eq!(raw.resolve(), Err(ConfigError::EmptyPool("plus2".to_string())));
}

#[rstest]
#[case(0.0, 0.1, None)]
#[case(-1.0, 0.1, None)]
#[case(2.0, 0.0, None)]
#[case(2.0, 2.5, None)]
#[case(2.0, 0.1, Some(0.0))]
#[case(2.0, 0.1, Some(2.1))]
fn test_current_parameters_out_of_range(
    #[case] total: f64,
    #[case] step: f64,
    #[case] limit: Option<f64>,
) {
    let raw = RawConfig {
        total_current: total,
        current_step: step,
        channel_limit: limit,
        ..valid_raw()
    };
    let err = raw.resolve().expect_err("out-of-range currents must fail");
    assert!(matches!(
        err,
        ConfigError::NonPositiveCurrent(_)
            | ConfigError::StepOutOfRange { .. }
            | ConfigError::LimitOutOfRange { .. }
    ));
}

#[test]
fn test_limit_equal_to_total_is_accepted() {
    let raw = RawConfig {
        channel_limit: Some(2.0),
        ..valid_raw()
    };
    assert_eq!(raw.resolve().map(|c| c.channel_limit), Ok(Some(2.0)));
}

#[test]
fn test_duplicates_within_pool_are_dropped() {
    let raw = RawConfig {
        plus1: "E1,E2,E1 E2".to_string(),
        ..valid_raw()
    };
    assert_eq!(raw.resolve().map(|c| c.pools.plus1), Ok(vec!["E1".to_string(), "E2".to_string()]));
}

#[test]
fn test_all_combinations_falls_back_to_plus1_pool() {
    let raw = RawConfig {
        all_combinations: true,
        ..valid_raw()
    };
    let config = raw.resolve().expect("lenient fallback");
    assert_eq!(config.policy, EnumerationPolicy::AllDistinct);
    for pool in [
        &config.pools.minus1,
        &config.pools.plus2,
        &config.pools.minus2,
    ] {
        assert_eq!(pool, &config.pools.plus1);
    }
    assert_eq!(config.shared_pool(), ["E1", "E2"]);
}

#[test]
fn test_all_combinations_with_shared_pool() {
    let pool = "C3,C4,Cz,Pz";
    let raw = RawConfig {
        plus1: pool.to_string(),
        minus1: "Pz Cz C4 C3".to_string(),
        plus2: pool.to_string(),
        minus2: pool.to_string(),
        all_combinations: true,
        ..valid_raw()
    };
    let config = raw.resolve().expect("shared pool");
    assert_eq!(config.shared_pool().len(), 4);
}

#[test]
fn test_roi_inline_center() {
    let raw = RawConfig {
        roi_center: Some("-10.5, 4, 22".to_string()),
        roi_radius: 5.0,
        ..valid_raw()
    };
    let roi = raw.roi_spec().expect("inline centre");
    assert_eq!(roi.center, [-10.5, 4.0, 22.0]);
    assert_eq!(roi.radius, 5.0);
}

#[test]
fn test_roi_from_csv_skips_header() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("roi.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "x,y,z").unwrap();
    writeln!(file, "1.5, -2.0, 30").unwrap();
    writeln!(file, "9,9,9").unwrap();

    let raw = RawConfig {
        roi_file: Some(path),
        ..valid_raw()
    };
    assert_eq!(raw.roi_spec().unwrap().center, [1.5, -2.0, 30.0]);
}

#[test]
fn test_roi_errors() {
    assert_eq!(
        valid_raw().roi_spec(),
        Err(ConfigError::MissingField("roi_center or roi_file"))
    );

    let bad_center = RawConfig {
        roi_center: Some("1,2".to_string()),
        ..valid_raw()
    };
    assert!(matches!(
        bad_center.roi_spec(),
        Err(ConfigError::InvalidValue { field: "roi_center", .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roi.csv");
    fs::write(&path, "x,y,z\n").unwrap();
    let no_rows = RawConfig {
        roi_file: Some(path),
        ..valid_raw()
    };
    assert!(matches!(no_rows.roi_spec(), Err(ConfigError::RoiFile { .. })));

    let negative = RawConfig {
        roi_center: Some("0,0,0".to_string()),
        roi_radius: -1.0,
        ..valid_raw()
    };
    assert!(negative.roi_spec().is_err());
}

#[test]
fn test_reference_tags() {
    let default_tags = RawConfig::default().reference_tag_set().unwrap();
    assert_eq!(default_tags, BTreeSet::from([GREY_MATTER_TAG]));

    let blank = RawConfig {
        reference_tags: "".to_string(),
        ..Default::default()
    };
    assert_eq!(blank.reference_tag_set().unwrap(), BTreeSet::from([2]));

    let many = RawConfig {
        reference_tags: "1, 2 1002".to_string(),
        ..Default::default()
    };
    assert_eq!(many.reference_tag_set().unwrap(), BTreeSet::from([1, 2, 1002]));

    let bad = RawConfig {
        reference_tags: "gm".to_string(),
        ..Default::default()
    };
    assert!(bad.reference_tag_set().is_err());
}

#[rstest]
#[case(99.9, true)]
#[case(0.0, true)]
#[case(100.0, true)]
#[case(100.5, false)]
#[case(-1.0, false)]
fn test_percentile_range(#[case] value: f64, #[case] ok: bool) {
    let raw = RawConfig {
        roi_percentile: value,
        ..Default::default()
    };
    assert_eq!(raw.percentile().is_ok(), ok);
}

#[test]
fn test_missing_leadfield_path() {
    assert_eq!(
        RawConfig::default().leadfield_path(),
        Err(ConfigError::MissingField("leadfield"))
    );
}

#[test]
fn test_json_file_uses_defaults_for_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("search.json");
    fs::write(
        &path,
        r#"{ "plus1": "E1", "minus1": "E2", "plus2": "E3", "minus2": "E4", "total_current": 1.5 }"#,
    )
    .unwrap();

    let raw = RawConfig::load_from_file(&path).expect("valid JSON");
    assert_eq!(raw.total_current, 1.5);
    assert_eq!(raw.current_step, 0.1);
    assert_eq!(raw.batch_size, 4096);
    assert!(raw.resolve().is_ok());

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        RawConfig::load_from_file(&path),
        Err(ConfigError::File(_))
    ));
}

#[test]
fn test_cli_overrides_only_explicit_flags() {
    let matches = TestCli::command()
        .get_matches_from(["tiforge", "--total-current", "3.0", "--plus1", "C3"]);
    let cli = TestCli::from_arg_matches(&matches).unwrap();

    let mut file_config = RawConfig {
        total_current: 1.5,
        current_step: 0.25,
        plus1: "E1".to_string(),
        minus1: "E2".to_string(),
        ..Default::default()
    };
    file_config.merge_from_cli(&cli.config, &matches);

    assert_eq!(file_config.total_current, 3.0);
    assert_eq!(file_config.plus1, "C3");
    // Clap defaults must not clobber file values.
    assert_eq!(file_config.current_step, 0.25);
    assert_eq!(file_config.minus1, "E2");
}
