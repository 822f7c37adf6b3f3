//! SICONFI (Tesouro Nacional) health and education spending.
//!
//! One RREO request per municipality. Committed values (`valor_empenhado`)
//! of accounts whose name mentions health or education are summed; when a
//! municipality ends up with nothing on both sides its estimate is used.

use super::assign_ranks;
use crate::api::{FetchError, FetchOutcome, HttpClient, HttpGet, fetch_json};
use crate::models::{Municipality, RankStatus, Report, SpendingRecord};
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

pub const SICONFI_BASE_URL: &str = "https://apidatalake.tesouro.gov.br/ords/siconfi/tt/rreo";
pub const DEFAULT_YEAR: i32 = 2023;
pub const SPENDING_REPORT_SOURCE: &str = "SICONFI - Tesouro Nacional";

const HEALTH_KEYWORDS: [&str; 3] = ["saude", "saúde", "sus"];
const EDUCATION_KEYWORDS: [&str; 3] = ["educacao", "educação", "ensino"];

/// Colour of the top spender, greener than the shared `good` colour.
const TOP_SPENDER_COLOR: &str = "#059669";

/// Health and education totals for one municipality, in reais.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HealthEducation {
    pub saude: f64,
    pub educacao: f64,
}

impl HealthEducation {
    pub fn is_empty(&self) -> bool {
        self.saude == 0.0 && self.educacao == 0.0
    }

    pub fn total(&self) -> f64 {
        self.saude + self.educacao
    }
}

/// Historical spending estimates used when the API has nothing.
pub fn estimated_values(municipality: Municipality) -> HealthEducation {
    let (saude, educacao) = match municipality {
        Municipality::MonteSanto => (8_500_000.0, 12_300_000.0),
        Municipality::Cansancao => (4_200_000.0, 6_800_000.0),
        Municipality::Uaua => (6_100_000.0, 9_200_000.0),
        Municipality::Quijingue => (3_800_000.0, 5_900_000.0),
        Municipality::EuclidesDaCunha => (7_800_000.0, 11_500_000.0),
        Municipality::SenhorDoBonfim => (15_200_000.0, 22_100_000.0),
    };
    HealthEducation { saude, educacao }
}

/// Convert a reported amount into a float.
///
/// Numbers pass through. Strings lose `R$` and `.` thousands separators and
/// have their decimal comma turned into a point. Anything unparsable is 0.
pub fn parse_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let clean = s.replace("R$", "").replace('.', "").replace(',', ".");
            clean.trim().parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Sum health and education committed values from an RREO response.
///
/// Failed requests and responses without a non-empty `items` array give
/// zeros.
pub fn extract_health_education_values(outcome: &FetchOutcome<Value>) -> HealthEducation {
    let Some(items) = outcome
        .data()
        .and_then(|data| data.get("items"))
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
    else {
        return HealthEducation::default();
    };

    let mut totals = HealthEducation::default();
    for item in items {
        let conta = item
            .get("conta")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let valor = || item.get("valor_empenhado").map(parse_value).unwrap_or(0.0);

        if HEALTH_KEYWORDS.iter().any(|k| conta.contains(k)) {
            totals.saude += valor();
        }
        if EDUCATION_KEYWORDS.iter().any(|k| conta.contains(k)) {
            totals.educacao += valor();
        }
    }
    totals
}

/// Spending ranks: the top spender is `good` in green, the last two are
/// `alert`, everything in between is `warning`.
fn rank_by_position(i: usize, len: usize) -> (RankStatus, &'static str) {
    if i == 0 {
        (RankStatus::Good, TOP_SPENDER_COLOR)
    } else if i + 2 >= len {
        (RankStatus::Alert, RankStatus::Alert.color())
    } else {
        (RankStatus::Warning, RankStatus::Warning.color())
    }
}

/// Client for the SICONFI RREO endpoint.
#[derive(Debug, Clone)]
pub struct SiconfiFetcher<C> {
    client: C,
    base_url: String,
    year: i32,
}

impl SiconfiFetcher<HttpClient> {
    pub fn new(year: i32) -> Result<Self, FetchError> {
        Ok(Self::with_client(HttpClient::for_apis()?, SICONFI_BASE_URL, year))
    }
}

impl<C: HttpGet> SiconfiFetcher<C> {
    pub fn with_client(client: C, base_url: impl Into<String>, year: i32) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            year,
        }
    }

    /// RREO data for one municipality and year.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_municipal_data(&self, codigo: &str, ano: i32) -> FetchOutcome<Value> {
        let ano = ano.to_string();
        let url = match Url::parse_with_params(
            &self.base_url,
            &[
                ("municipio", codigo),
                ("ano", ano.as_str()),
                ("tipo", "RREO"),
                ("fase", "1"),
            ],
        ) {
            Ok(url) => url,
            Err(e) => {
                return FetchOutcome::Failure {
                    error: e.to_string(),
                };
            }
        };

        let outcome = fetch_json(&self.client, url.as_str()).await;
        if let Some(error) = outcome.error() {
            warn!(%codigo, %error, "SICONFI request failed");
        }
        outcome
    }

    /// Health and education comparison across the municipalities.
    ///
    /// Sorted by total spending; the top municipality is `good`, the last two
    /// `alert` and everyone else `warning`.
    #[instrument(level = "info", skip(self), fields(year = self.year))]
    pub async fn generate_municipal_comparison(&self) -> Report<SpendingRecord> {
        info!("Fetching SICONFI data");

        let mut records = Vec::with_capacity(Municipality::ALL.len());
        for municipality in Municipality::ALL {
            info!(
                municipio = %municipality,
                codigo = municipality.ibge_code(),
                "Processing municipality"
            );

            let outcome = self
                .fetch_municipal_data(municipality.ibge_code(), self.year)
                .await;
            let mut values = extract_health_education_values(&outcome);
            if values.is_empty() {
                values = estimated_values(municipality);
            }

            records.push(SpendingRecord {
                municipio: municipality.name().to_string(),
                codigo: municipality.ibge_code().to_string(),
                saude: values.saude,
                educacao: values.educacao,
                total: values.total(),
                status: RankStatus::Warning,
                rank_color: String::new(),
            });
        }

        records.sort_by(|a, b| b.total.total_cmp(&a.total));
        assign_ranks(&mut records, rank_by_position, |record, status, color| {
            record.status = status;
            record.rank_color = color.to_string();
        });

        info!(count = records.len(), "Municipal data processed");
        Report {
            success: true,
            data: records,
            source: SPENDING_REPORT_SOURCE.to_string(),
            year: self.year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::StubClient;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(&json!(1500.5)), 1500.5);
        assert_eq!(parse_value(&json!(42)), 42.0);
        assert_eq!(parse_value(&json!("R$ 1.234.567,89")), 1234567.89);
        assert_eq!(parse_value(&json!("  ")), 0.0);
        assert_eq!(parse_value(&json!("n/d")), 0.0);
        assert_eq!(parse_value(&Value::Null), 0.0);
    }

    #[test]
    fn test_extract_values_sums_matching_accounts() {
        let outcome = FetchOutcome::Success {
            data: json!({
                "items": [
                    {"conta": "Despesas com Saúde", "valor_empenhado": 1000.0},
                    {"conta": "Transferências SUS", "valor_empenhado": "R$ 500,50"},
                    {"conta": "Manutenção do Ensino", "valor_empenhado": 2000},
                    {"conta": "EDUCACAO INFANTIL", "valor_empenhado": "1.000,00"},
                    {"conta": "Segurança Pública", "valor_empenhado": 9999.0},
                    {"valor_empenhado": 123.0}
                ]
            }),
        };

        let values = extract_health_education_values(&outcome);
        assert_eq!(values.saude, 1500.5);
        assert_eq!(values.educacao, 3000.0);
    }

    #[test]
    fn test_extract_values_zero_on_failure_or_empty() {
        let failure = FetchOutcome::Failure {
            error: "HTTP 500".to_string(),
        };
        assert!(extract_health_education_values(&failure).is_empty());

        let empty = FetchOutcome::Success {
            data: json!({"items": []}),
        };
        assert!(extract_health_education_values(&empty).is_empty());

        let no_items = FetchOutcome::Success { data: json!([]) };
        assert!(extract_health_education_values(&no_items).is_empty());
    }

    #[test]
    fn test_rank_by_position() {
        let ranks = (0..6).map(|i| rank_by_position(i, 6).0).collect::<Vec<_>>();
        assert_eq!(
            ranks,
            vec![
                RankStatus::Good,
                RankStatus::Warning,
                RankStatus::Warning,
                RankStatus::Warning,
                RankStatus::Alert,
                RankStatus::Alert
            ]
        );
    }

    #[test]
    fn test_rank_colors() {
        let colors = (0..6).map(|i| rank_by_position(i, 6).1).collect::<Vec<_>>();
        assert_eq!(
            colors,
            vec!["#059669", "#d97706", "#d97706", "#d97706", "#dc2626", "#dc2626"]
        );
    }

    #[tokio::test]
    async fn test_comparison_uses_estimates_on_server_error() {
        let client = StubClient::new().fail("rreo", 500);
        let fetcher = SiconfiFetcher::with_client(client, SICONFI_BASE_URL, DEFAULT_YEAR);

        let report = fetcher.generate_municipal_comparison().await;

        assert!(report.success);
        assert_eq!(report.year, 2023);
        assert_eq!(report.data.len(), 6);
        let top = &report.data[0];
        assert_eq!(top.municipio, "Senhor do Bonfim");
        assert_eq!(top.total, 37_300_000.0);
        assert_eq!(top.status, RankStatus::Good);
        assert_eq!(top.rank_color, "#059669");

        let last = &report.data[5];
        assert_eq!(last.municipio, "Quijingue");
        assert_eq!(last.status, RankStatus::Alert);
        assert_eq!(report.data[4].municipio, "Cansanção");
        assert_eq!(report.data[4].status, RankStatus::Alert);
        assert_eq!(report.data[1].status, RankStatus::Warning);
    }

    #[tokio::test]
    async fn test_comparison_prefers_live_values() {
        let client = StubClient::new()
            .respond(
                "municipio=2925807",
                r#"{"items": [{"conta": "Saúde", "valor_empenhado": 90000000.0}]}"#,
            )
            .fail("rreo", 500);
        let fetcher = SiconfiFetcher::with_client(client, SICONFI_BASE_URL, 2022);

        let report = fetcher.generate_municipal_comparison().await;

        let top = &report.data[0];
        assert_eq!(top.municipio, "Quijingue");
        assert_eq!(top.saude, 90_000_000.0);
        assert_eq!(top.educacao, 0.0);
        assert_eq!(report.year, 2022);
    }

    #[tokio::test]
    async fn test_request_url() {
        let client = StubClient::new();
        let fetcher = SiconfiFetcher::with_client(client, SICONFI_BASE_URL, DEFAULT_YEAR);

        let outcome = fetcher.fetch_municipal_data("2921400", 2023).await;

        assert_eq!(outcome.error(), Some("HTTP 404"));
        assert_eq!(
            fetcher.client.calls(),
            vec!["https://apidatalake.tesouro.gov.br/ords/siconfi/tt/rreo?municipio=2921400&ano=2023&tipo=RREO&fase=1"]
        );
    }
}
