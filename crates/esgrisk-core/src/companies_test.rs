use super::*;

fn company(name: &str, ticker: &str, region: Region) -> CompanyConfig {
    CompanyConfig {
        name: name.to_string(),
        ticker: ticker.to_string(),
        sector: "Technology".to_string(),
        region,
        industry: None,
        country: None,
    }
}

#[test]
fn normalized_ticker_uppercases_and_trims() {
    let c = company("Nokia", " nokia.he ", Region::Europe);
    assert_eq!(c.normalized_ticker(), "NOKIA.HE");
}

#[test]
fn validate_rejects_empty_name() {
    let file = CompaniesFile {
        companies: vec![company("  ", "AAPL", Region::Americas)],
    };
    let err = validate_companies(&file).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_empty_ticker() {
    let file = CompaniesFile {
        companies: vec![company("Apple Inc.", "   ", Region::Americas)],
    };
    let err = validate_companies(&file).unwrap_err();
    assert!(err.to_string().contains("empty ticker"));
}

#[test]
fn validate_rejects_duplicate_name() {
    let file = CompaniesFile {
        companies: vec![
            company("Siemens AG", "SIE.DE", Region::Europe),
            company("siemens ag", "SIEGY", Region::Europe),
        ],
    };
    let err = validate_companies(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate company name"));
}

#[test]
fn validate_rejects_duplicate_ticker_case_insensitive() {
    let file = CompaniesFile {
        companies: vec![
            company("Apple Inc.", "AAPL", Region::Americas),
            company("Apple Holdings", "aapl", Region::Americas),
        ],
    };
    let err = validate_companies(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate ticker"));
}

#[test]
fn validate_accepts_valid_companies() {
    let file = CompaniesFile {
        companies: vec![
            company("Apple Inc.", "AAPL", Region::Americas),
            company("Saudi Aramco", "2222.SR", Region::MiddleEast),
        ],
    };
    assert!(validate_companies(&file).is_ok());
}

#[test]
fn region_parses_middle_east_with_space() {
    let yaml = "companies:\n  - name: QatarEnergy\n    ticker: QE\n    sector: Energy\n    region: Middle East\n";
    let file: CompaniesFile = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(file.companies[0].region, Region::MiddleEast);
    assert_eq!(file.companies[0].region.to_string(), "Middle East");
}

#[test]
fn unknown_region_fails_to_parse() {
    let yaml = "companies:\n  - name: Acme\n    ticker: ACME\n    sector: Industrial\n    region: Antarctica\n";
    assert!(serde_yaml::from_str::<CompaniesFile>(yaml).is_err());
}

#[test]
fn load_companies_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("companies.yaml");
    assert!(
        path.exists(),
        "companies.yaml missing at {path:?}, required for this test"
    );
    let result = load_companies(&path);
    assert!(result.is_ok(), "failed to load companies.yaml: {result:?}");
    let companies_file = result.unwrap();
    assert!(!companies_file.companies.is_empty());
}

#[test]
fn load_companies_missing_file_reports_path() {
    let err = load_companies(Path::new("/nonexistent/companies.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileIo { ref path, .. } if path.contains("nonexistent")));
}
