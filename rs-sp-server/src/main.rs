use std::path::Path;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rs_sp_core::io::{list_files, load_corpus_sizes};
use rs_sp_core::{Corpus, Exposure, LearnerKind, ProductivityPipeline, ProductivityReport, SpConfig, TieBreak};

const DATA_DIR: &str = "./data";
const CONFIG_FILE: &str = "./data/sp.toml";
const CORPUS_EXTENSION: &str = "tsv";

/// Query parameters for the `/v1/load_corpus` endpoint
#[derive(Deserialize)]
struct LoadParams {
	name: Option<String>,
	sizes: Option<String>,
	window: Option<u64>,
	ntrim: Option<usize>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct LearnerQuery {
	learner: Option<String>,
}

#[derive(Deserialize)]
struct ExposureQuery {
	exposure: Option<String>,
}

#[derive(Deserialize)]
struct TimeQuery {
	time: Option<i64>,
}

struct SharedData {
	config: SpConfig,
	report: Option<ProductivityReport>,
}

impl LoadParams {
	/// Overlays the query parameters on the current configuration.
	fn config(&self, base: &SpConfig) -> Result<SpConfig, String> {
		let mut config = base.clone();
		if let Some(window) = self.window {
			config.window = window;
		}
		if let Some(ntrim) = self.ntrim {
			config.ntrim = ntrim;
		}
		if let Some(seed) = self.seed {
			config.tie_break = TieBreak::Seeded { seed };
		}
		config.validate().map_err(|e| e.to_string())?;
		Ok(config)
	}
}

fn parse_exposure(value: &str) -> Option<Exposure> {
	match value.trim().to_lowercase().as_str() {
		"panchronic" | "p" => Some(Exposure::Panchronic),
		"synchronic" | "s" => Some(Exposure::Synchronic),
		_ => None,
	}
}

/// Runs the pipeline on `./data/{name}.tsv`, with an optional `./data/{sizes}.tsv` override.
fn run_corpus(config: SpConfig, name: &str, sizes: Option<&str>) -> Result<ProductivityReport, String> {
	let corpus = Corpus::from_file(Path::new(DATA_DIR).join(format!("{name}.{CORPUS_EXTENSION}")))
		.map_err(|e| format!("Failed to load corpus: {e}"))?;

	let mut pipeline = ProductivityPipeline::new(config).map_err(|e| e.to_string())?;
	if let Some(sizes) = sizes {
		let path = Path::new(DATA_DIR).join(format!("{sizes}.{CORPUS_EXTENSION}"));
		let sizes = load_corpus_sizes(path).map_err(|e| format!("Failed to load corpus sizes: {e}"))?;
		pipeline = pipeline.with_corpus_sizes(sizes);
	}

	pipeline.run(&corpus).map_err(|e| format!("Run failed: {e}"))
}

/// HTTP GET endpoint `/v1/corpora`
///
/// Lists corpus files available in the data directory.
#[get("/v1/corpora")]
async fn get_corpora() -> impl Responder {
	match list_files(DATA_DIR, CORPUS_EXTENSION) {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(&format!(".{CORPUS_EXTENSION}"), "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Loads a corpus, runs the pipeline and replaces the current report.
#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<LoadParams>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};

	let config = match query.config(&shared_data.config) {
		Ok(c) => c,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	match run_corpus(config.clone(), &name, query.sizes.as_deref()) {
		Ok(report) => {
			let summary = report.summary().to_string();
			shared_data.config = config;
			shared_data.report = Some(report);
			HttpResponse::Ok().body(summary)
		}
		Err(e) => {
			warn!(corpus = %name, "{e}");
			HttpResponse::InternalServerError().body(e)
		}
	}
}

/// HTTP GET endpoint `/v1/snapshots`
///
/// Returns the snapshot series of one learner (`ep`, `es`, `ip`, `is`), or all of them.
#[get("/v1/snapshots")]
async fn get_snapshots(data: web::Data<Mutex<SharedData>>, query: web::Query<LearnerQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};
	let Some(report) = &shared_data.report else {
		return HttpResponse::NotFound().body("No corpus loaded");
	};

	match &query.learner {
		None => HttpResponse::Ok().json(report.snapshots()),
		Some(value) => match LearnerKind::parse(value) {
			Some(learner) => HttpResponse::Ok().json(report.series(learner).collect::<Vec<_>>()),
			None => HttpResponse::BadRequest().body("Learner must be one of ep, es, ip, is"),
		},
	}
}

/// HTTP GET endpoint `/v1/comparison`
///
/// Experienced vs inexperienced series for `panchronic` or `synchronic` exposure.
#[get("/v1/comparison")]
async fn get_comparison(data: web::Data<Mutex<SharedData>>, query: web::Query<ExposureQuery>) -> impl Responder {
	let exposure = match query.exposure.as_deref().map(parse_exposure) {
		None => Exposure::Panchronic,
		Some(Some(exposure)) => exposure,
		Some(None) => return HttpResponse::BadRequest().body("Exposure must be 'panchronic' or 'synchronic'"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};
	match &shared_data.report {
		Some(report) => HttpResponse::Ok().json(report.comparison(exposure)),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

/// HTTP GET endpoint `/v1/structures`
///
/// Structure rows of one time slice.
#[get("/v1/structures")]
async fn get_structures(data: web::Data<Mutex<SharedData>>, query: web::Query<TimeQuery>) -> impl Responder {
	let Some(time) = query.time else {
		return HttpResponse::BadRequest().body("Missing time");
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};
	match &shared_data.report {
		Some(report) => HttpResponse::Ok().json(report.structures_at(time)),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

#[get("/v1/window_spans")]
async fn get_window_spans(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};
	match &shared_data.report {
		Some(report) => HttpResponse::Ok().json(report.window_spans()),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

#[get("/v1/summary")]
async fn get_summary(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Report lock failed"),
	};
	match &shared_data.report {
		Some(report) => HttpResponse::Ok().json(report.summary()),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

/// Reads `./data/sp.toml` and, if it names a source, runs it once at startup.
fn initial_state() -> SharedData {
	let config = match SpConfig::from_file(CONFIG_FILE) {
		Ok(config) => config,
		Err(e) => {
			warn!("No usable {CONFIG_FILE} ({e}), using window = 1000, ntrim = 1000");
			SpConfig { window: 1000, ntrim: 1000, tie_break: TieBreak::Lexical, threads: 0, source: None }
		}
	};

	let report = match config.source.is_some() {
		false => None,
		true => match ProductivityPipeline::from_source(config.clone()).and_then(|(pipeline, corpus)| pipeline.run(&corpus)) {
			Ok(report) => Some(report),
			Err(e) => {
				error!("Startup run failed: {e}");
				None
			}
		},
	};

	SharedData { config, report }
}

/// Main entry point for the server.
///
/// Loads the optional startup configuration, wraps the report in a `Mutex`,
/// and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - CORS is permissive so a plotting front-end can query it from a browser.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_target(true)
		.init();

	let shared_data = web::Data::new(Mutex::new(initial_state()));
	info!("rs-sp-server listening on 127.0.0.1:5000");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_corpora)
			.service(put_corpus)
			.service(get_snapshots)
			.service(get_comparison)
			.service(get_structures)
			.service(get_window_spans)
			.service(get_summary)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
