use std::net::IpAddr;

use actix_web::{get, head, post, web, App, HttpResponse, HttpServer};
use catalog::dedup::{DeduplicationConfig, Strategy};
use catalog::service::SearchOptions;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::prelude::*;

const INDEX_HTML: &str = include_str!("serve.html");

/// Serve the catalog to web browsers.
#[derive(Debug, clap::Parser)]
pub(crate) struct Serve {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    source: SourceArgs,

    #[arg(short, long, default_value = "9001")]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    address: IpAddr,
}

type AppState = web::Data<Mutex<Service>>;

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    deduplicate: Option<bool>,
}

/// A partial deduplication config. Options left out keep their
/// current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct DeduplicationUpdate {
    enabled: Option<bool>,
    strategy: Option<Strategy>,
    keep_latest: Option<bool>,
    case_sensitive: Option<bool>,
}

impl DeduplicationUpdate {
    fn merge(
        self,
        config: &DeduplicationConfig,
    ) -> DeduplicationConfig {
        DeduplicationConfig {
            enabled: self.enabled.unwrap_or(config.enabled),
            strategy: self.strategy.unwrap_or(config.strategy),
            keep_latest: self.keep_latest.unwrap_or(config.keep_latest),
            case_sensitive: self
                .case_sensitive
                .unwrap_or(config.case_sensitive),
        }
    }
}

#[head("/health-check")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/api/datasets")]
async fn datasets(state: AppState) -> HttpResponse {
    let service = state.lock().await;
    HttpResponse::Ok().json(service.browse())
}

#[get("/api/search")]
async fn search(
    state: AppState,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let mut service = state.lock().await;
    let options = SearchOptions {
        deduplicate: query.deduplicate,
    };

    HttpResponse::Ok().json(service.search(&query.q, options))
}

/// Updates the deduplication options given in the body and applies
/// them. Returns the summary of the new active view.
#[post("/api/deduplication")]
async fn deduplication(
    state: AppState,
    update: web::Json<DeduplicationUpdate>,
) -> HttpResponse {
    let mut service = state.lock().await;
    let config = update.into_inner().merge(service.deduplication());
    service.set_deduplication(config);

    log::info!("deduplication set to {:?}", service.deduplication());
    HttpResponse::Ok().json(service.summary())
}

#[post("/api/reload")]
async fn reload(state: AppState) -> HttpResponse {
    let mut service = state.lock().await;

    match service.load().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            log::error!("reload failed: {e}");
            HttpResponse::BadGateway().body(e.to_string())
        }
    }
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(index)
        .service(datasets)
        .service(search)
        .service(deduplication)
        .service(reload);
}

impl Serve {
    pub(crate) async fn execute(self) -> DatacatResult<()> {
        let config = Datacat::config_or_default()?;
        let service = self.source.load(config, self.quiet).await?;
        let state = web::Data::new(Mutex::new(service));

        if !self.quiet {
            eprintln!(
                "Serving catalog on http://{}:{}",
                self.address, self.port
            );
        }

        HttpServer::new(move || {
            App::new().app_data(state.clone()).configure(configure)
        })
        .workers(2)
        .bind((self.address, self.port))?
        .run()
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use catalog::config::Config;
    use serde_json::Value;

    use super::*;

    type TestResult = anyhow::Result<()>;

    async fn state(dir: &std::path::Path) -> anyhow::Result<AppState> {
        fs::create_dir_all(dir.join("reports"))?;
        let titles =
            [("a", "Report"), ("b", "report "), ("c", "Survey")];
        for (name, title) in titles {
            fs::write(
                dir.join(format!("reports/{name}.json")),
                format!(r#"{{"@type": "Dataset", "name": "{title}"}}"#),
            )?;
        }

        let args = SourceArgs::for_dir(dir);
        let service = args.load(Config::default(), true).await?;
        Ok(web::Data::new(Mutex::new(service)))
    }

    #[actix_web::test]
    async fn api_round_trip() -> TestResult {
        let dir = tempfile::tempdir()?;
        let state = state(dir.path()).await?;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::HEAD)
            .uri("/health-check")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req =
            test::TestRequest::get().uri("/api/datasets").to_request();
        let value: Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(value["metadata"]["totalDatasets"], 3);

        let req = test::TestRequest::get()
            .uri("/api/search?q=report&deduplicate=true")
            .to_request();
        let value: Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(value["totalResults"], 1);
        let dedup = &value["metadata"]["deduplication"];
        assert_eq!(dedup["duplicatesRemoved"], 1);

        let req = test::TestRequest::post()
            .uri("/api/deduplication")
            .set_json(serde_json::json!({ "enabled": false }))
            .to_request();
        let value: Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(value["totalDatasets"], 3);

        let req =
            test::TestRequest::get().uri("/api/search?q=").to_request();
        let value: Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(value["totalResults"], 0);

        Ok(())
    }

    #[actix_web::test]
    async fn deduplication_update_keeps_other_options() -> TestResult {
        let dir = tempfile::tempdir()?;
        let state = state(dir.path()).await?;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        for body in [
            serde_json::json!({
                "case-sensitive": true,
                "keep-latest": false
            }),
            serde_json::json!({ "enabled": true }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/deduplication")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let service = state.lock().await;
        let config = service.deduplication();
        assert!(config.enabled);
        assert!(config.case_sensitive);
        assert!(!config.keep_latest);

        // "Report" and "report" differ case-sensitively
        assert_eq!(service.index().len(), 3);
        Ok(())
    }

    #[actix_web::test]
    async fn invalid_deduplication_config_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;
        let state = state(dir.path()).await?;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/deduplication")
            .set_json(serde_json::json!({ "strategy": "fuzzy" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!state.lock().await.deduplication().enabled);

        Ok(())
    }
}
