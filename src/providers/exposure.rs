//! Beneficiary exposure estimates from the CMS Medicare Part D spending
//! dataset. Always approximate; used only to contextualize adverse-event
//! counts.

use std::time::Instant;

use serde_json::Value;

use crate::config::timeouts;
use crate::net::{FetchError, UpstreamClient};

use super::{ExposureData, ProviderReply};

const CMS_BASE: &str = "https://data.cms.gov/data-api/v1/dataset";
/// Medicare Part D spending-by-drug dataset.
const DATASET_ID: &str = "spending-by-drug-part-d";
/// Reference year of the dataset snapshot.
const DATASET_YEAR: i32 = 2022;

pub async fn fetch_exposure(client: &UpstreamClient, name: &str) -> ProviderReply<ExposureData> {
    let started = Instant::now();
    let url = format!(
        "{CMS_BASE}/{DATASET_ID}/data?filter%5BGnrc_Name%5D={}&size=1",
        urlencoding::encode(name)
    );
    match client.get_json(&url, timeouts::EXPOSURE).await {
        Ok(body) => ProviderReply::from_option(extract_exposure(&body), started),
        Err(FetchError::Status { status: 404 }) => ProviderReply::not_found(started),
        Err(err) => ProviderReply::failed(err.into(), started),
    }
}

/// The dataset serves numbers as strings or numerics depending on the
/// column; accept both.
pub(crate) fn extract_exposure(body: &Value) -> Option<ExposureData> {
    let row = body.as_array()?.first()?;
    let beneficiaries = match row.get("Tot_Benes")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().replace(',', "").parse().ok()?,
        _ => return None,
    };
    if beneficiaries == 0 {
        return None;
    }
    Some(ExposureData {
        beneficiaries,
        year: DATASET_YEAR,
        source: "cms_part_d".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_numeric_beneficiaries() {
        let body = json!([{"Gnrc_Name": "Warfarin Sodium", "Tot_Benes": 1_250_000}]);
        let exposure = extract_exposure(&body).unwrap();
        assert_eq!(exposure.beneficiaries, 1_250_000);
        assert_eq!(exposure.year, DATASET_YEAR);
        assert_eq!(exposure.source, "cms_part_d");
    }

    #[test]
    fn extracts_string_beneficiaries_with_separators() {
        let body = json!([{"Tot_Benes": "1,250,000"}]);
        assert_eq!(extract_exposure(&body).unwrap().beneficiaries, 1_250_000);
    }

    #[test]
    fn empty_or_zero_rows_read_as_absent() {
        assert!(extract_exposure(&json!([])).is_none());
        assert!(extract_exposure(&json!([{"Tot_Benes": 0}])).is_none());
        assert!(extract_exposure(&json!([{"Tot_Benes": "garbage"}])).is_none());
        assert!(extract_exposure(&json!({"rows": []})).is_none());
    }
}
