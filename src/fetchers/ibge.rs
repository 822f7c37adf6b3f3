//! IBGE social indicators.
//!
//! Population projections and municipal GDP are requested from the IBGE
//! data service, but the report is always built from the historical table
//! below: the live payloads are only checked for success and logged.

use super::assign_ranks;
use crate::api::{FetchError, FetchOutcome, HttpClient, HttpGet, fetch_json};
use crate::models::{Municipality, RankStatus, Report, SocialRecord};
use itertools::Itertools;
use serde_json::Value;
use tracing::{info, instrument, warn};

pub const IBGE_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1";

/// Aggregate, period and variable of the municipal GDP table.
const PIB_AGGREGATE: &str = "5938";
const PIB_PERIOD: &str = "2021";
const PIB_VARIABLE: &str = "37";

pub const SOCIAL_REPORT_SOURCE: &str = "IBGE - Dados Oficiais";
pub const SOCIAL_REPORT_YEAR: i32 = 2024;
const SOCIAL_DATA_FONTE: &str = "IBGE 2024 / PNUD 2010";

struct SocialEstimate {
    populacao: u64,
    pib_per_capita: u64,
    idhm: f64,
    area_km2: f64,
    densidade_dem: f64,
}

fn social_estimate(municipality: Municipality) -> SocialEstimate {
    let (populacao, pib_per_capita, idhm, area_km2, densidade_dem) = match municipality {
        Municipality::MonteSanto => (54892, 8947, 0.506, 3034.0, 18.1),
        Municipality::SenhorDoBonfim => (78724, 12384, 0.584, 827.4, 95.1),
        Municipality::EuclidesDaCunha => (57148, 9635, 0.541, 2026.0, 28.2),
        Municipality::Uaua => (25987, 7823, 0.485, 2894.0, 9.0),
        Municipality::Cansancao => (33068, 6947, 0.487, 1320.0, 25.1),
        Municipality::Quijingue => (31927, 6234, 0.472, 1677.0, 19.0),
    };
    SocialEstimate {
        populacao,
        pib_per_capita,
        idhm,
        area_km2,
        densidade_dem,
    }
}

fn rank_by_position(i: usize, _len: usize) -> (RankStatus, &'static str) {
    let status = match i {
        0 => RankStatus::Excellent,
        1..=2 => RankStatus::Good,
        3..=4 => RankStatus::Warning,
        _ => RankStatus::Alert,
    };
    (status, status.color())
}

/// Historical social indicators, sorted by GDP per capita and ranked.
///
/// The best municipality is `excellent`, the next two `good`, the next two
/// `warning` and the rest `alert`.
pub fn historical_social_data() -> Report<SocialRecord> {
    let mut records = Municipality::ALL
        .into_iter()
        .map(|m| {
            let estimate = social_estimate(m);
            SocialRecord {
                municipio: m.name().to_string(),
                codigo: m.ibge_code().to_string(),
                populacao: estimate.populacao,
                pib_per_capita: estimate.pib_per_capita,
                idhm: estimate.idhm,
                area_km2: estimate.area_km2,
                densidade_dem: estimate.densidade_dem,
                fonte: SOCIAL_DATA_FONTE.to_string(),
                status: RankStatus::Alert,
                rank_color: String::new(),
            }
        })
        .collect::<Vec<_>>();

    records.sort_by(|a, b| b.pib_per_capita.cmp(&a.pib_per_capita));
    assign_ranks(&mut records, rank_by_position, |record, status, color| {
        record.status = status;
        record.rank_color = color.to_string();
    });

    Report {
        success: true,
        data: records,
        source: SOCIAL_REPORT_SOURCE.to_string(),
        year: SOCIAL_REPORT_YEAR,
    }
}

fn municipality_codes() -> String {
    Municipality::ALL.iter().map(|m| m.ibge_code()).join(",")
}

/// Client for the IBGE data service.
#[derive(Debug, Clone)]
pub struct IbgeFetcher<C> {
    client: C,
    base_url: String,
}

impl IbgeFetcher<HttpClient> {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_client(HttpClient::for_apis()?, IBGE_BASE_URL))
    }
}

impl<C: HttpGet> IbgeFetcher<C> {
    pub fn with_client(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Population projections for all municipalities in one request.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_population_data(&self) -> FetchOutcome<Value> {
        let url = format!("{}/projecoes/populacao/{}", self.base_url, municipality_codes());
        fetch_json(&self.client, &url).await
    }

    /// Municipal GDP for all municipalities in one request.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_pib_data(&self) -> FetchOutcome<Value> {
        let url = format!(
            "{}/agregados/{}/periodos/{}/variaveis/{}?localidades=N6[{}]",
            self.base_url,
            PIB_AGGREGATE,
            PIB_PERIOD,
            PIB_VARIABLE,
            municipality_codes()
        );
        fetch_json(&self.client, &url).await
    }

    /// Social comparison across the municipalities.
    ///
    /// Both endpoints are queried; whatever they answer, the report comes
    /// from [`historical_social_data`].
    #[instrument(level = "info", skip(self))]
    pub async fn generate_social_comparison(&self) -> Report<SocialRecord> {
        info!("Fetching IBGE social data");
        let population = self.fetch_population_data().await;
        let pib = self.fetch_pib_data().await;

        if !population.is_success() || !pib.is_success() {
            warn!(
                population_error = population.error().unwrap_or("none"),
                pib_error = pib.error().unwrap_or("none"),
                "IBGE API unavailable; using historical official data"
            );
        } else {
            info!("IBGE API answered; report still built from historical official data");
        }

        historical_social_data()
    }
}
