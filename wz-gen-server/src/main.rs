use std::path::Path;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use wz_gen_core::io::list_files;
use wz_gen_core::model::generator::{generate_batch, Generator, PHONOLOGY_EXTENSIONS};
use wz_gen_core::model::phonology::Phonology;
use wz_gen_core::model::weights::Distribution;
use wz_gen_core::session::SessionReport;
use wz_gen_core::{Error, ErrorKind};

const DATA_FOLDER: &str = "./data";
const BUNDLED_NAME: &str = "wizard_names";
/// Largest batch a single request may ask for.
const MAX_WORDS: usize = 10_000;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	words: Option<usize>,
	syllables: Option<usize>,
	distribution: Option<String>,
	alpha: Option<bool>,
	dedup: Option<bool>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct PhonologyQuery {
	name: Option<String>,
}

struct SharedData {
	generator: Generator,
	current: String,
}

impl GenerateParams {
	fn distribution(&self) -> Result<Distribution, Error> {
		match &self.distribution {
			None => Ok(Distribution::default()),
			Some(s) => s.parse(),
		}
	}
}

fn error_response(error: &Error) -> HttpResponse {
	match error.kind() {
		ErrorKind::Validation | ErrorKind::Lookup | ErrorKind::Format => HttpResponse::BadRequest().body(error.to_string()),
		ErrorKind::Exhaustion => HttpResponse::UnprocessableEntity().body(error.to_string()),
		ErrorKind::Assertion | ErrorKind::Io => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a batch of words from the current phonology.
/// Returns the summary line followed by one word per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let distribution = match query.distribution() {
		Ok(d) => d,
		Err(e) => return error_response(&e),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	let shared_data = &mut *shared_data;

	let word_count = query.words.unwrap_or(10);
	if word_count > MAX_WORDS {
		return HttpResponse::BadRequest().body(format!("At most {MAX_WORDS} words per request"));
	}

	let mut input = match shared_data.generator.make_batch_input(word_count, query.syllables.unwrap_or(2)) {
		Ok(input) => input,
		Err(e) => return error_response(&e),
	};
	input.sort = query.alpha.unwrap_or(true);
	input.deduplicate = query.dedup.unwrap_or(true);

	let phonology = match shared_data.generator.compile(&shared_data.current, distribution) {
		Ok(p) => p,
		Err(e) => return error_response(&e),
	};

	let words = match query.seed {
		Some(seed) => generate_batch(&phonology, &input, &mut StdRng::seed_from_u64(seed)),
		None => shared_data.generator.generate_batch(&phonology, &input),
	};

	match words {
		Ok(words) => {
			let report = SessionReport {
				language: phonology.language().to_owned(),
				syllables: input.syllable_count(),
				words,
			};
			HttpResponse::Ok().body(report.to_string())
		}
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/phonologies`
///
/// Lists the bundled phonology first, then the files of `./data`.
#[get("/v1/phonologies")]
async fn get_phonologies() -> impl Responder {
	match list_files(DATA_FOLDER, &PHONOLOGY_EXTENSIONS) {
		Ok(files) => {
			let mut names = vec![BUNDLED_NAME.to_owned()];
			names.extend(
				files
					.iter()
					.filter_map(|file| Path::new(file).file_stem())
					.map(|stem| stem.to_string_lossy().to_string())
					.filter(|name| name != BUNDLED_NAME),
			);
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list phonologies"),
	}
}

#[get("/v1/loaded_phonology")]
async fn get_loaded_phonology(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	HttpResponse::Ok().body(shared_data.current.clone())
}

/// A phonology name is a bare file stem inside `DATA_FOLDER`.
fn is_valid_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[put("/v1/load_phonology")]
async fn put_phonology(data: web::Data<Mutex<SharedData>>, query: web::Query<PhonologyQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty phonology name"),
	};
	if !is_valid_name(name) {
		return HttpResponse::BadRequest().body(format!("Invalid phonology name {name}"));
	}

	if shared_data.generator.phonology(name).is_none() {
		let path = PHONOLOGY_EXTENSIONS
			.iter()
			.map(|ext| Path::new(DATA_FOLDER).join(format!("{name}.{ext}")))
			.find(|path| path.is_file());
		let Some(path) = path else {
			return HttpResponse::NotFound().body(format!("Phonology {name} not found"));
		};
		if let Err(e) = shared_data.generator.load_phonology(&path) {
			warn!("Failed to load phonology {}: {}", path.display(), e);
			return error_response(&e);
		}
	}

	shared_data.current = name.to_owned();
	info!("Current phonology is now {name}");
	HttpResponse::Ok().body("Phonology loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with the bundled Wizard phonology, shares the generator behind a
/// `Mutex` and serves the API on 127.0.0.1:5000. Other phonologies are
/// loaded on demand from `./data`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let bundled = Phonology::bundled().map_err(std::io::Error::other)?;
	let shared_data = SharedData {
		generator: Generator::with_phonologies([(BUNDLED_NAME.to_owned(), bundled)]),
		current: BUNDLED_NAME.to_owned(),
	};
	let shared_generator = web::Data::new(Mutex::new(shared_data));

	info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_generator.clone())
			.service(get_generated)
			.service(get_phonologies)
			.service(put_phonology)
			.service(get_loaded_phonology)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{http::StatusCode, test};

	fn shared() -> web::Data<Mutex<SharedData>> {
		let bundled = Phonology::bundled().unwrap();
		web::Data::new(Mutex::new(SharedData {
			generator: Generator::with_phonologies([(BUNDLED_NAME.to_owned(), bundled)]),
			current: BUNDLED_NAME.to_owned(),
		}))
	}

	#[actix_web::test]
	async fn test_generate_seeded_report() {
		let app = test::init_service(App::new().app_data(shared()).service(get_generated)).await;

		let uri = "/v1/generate?words=5&syllables=2&seed=3";
		let first = test::call_and_read_body(&app, test::TestRequest::get().uri(uri).to_request()).await;
		let second = test::call_and_read_body(&app, test::TestRequest::get().uri(uri).to_request()).await;
		assert_eq!(first, second);

		let body = String::from_utf8(first.to_vec()).unwrap();
		let mut lines = body.lines();
		assert_eq!(lines.next(), Some("Wizard language: 5 words of 2 syllable(s) each."));
		assert_eq!(lines.count(), 5);
	}

	#[actix_web::test]
	async fn test_generate_rejects_bad_parameters() {
		let app = test::init_service(App::new().app_data(shared()).service(get_generated)).await;

		for uri in [
			"/v1/generate?distribution=gauss",
			"/v1/generate?words=0",
			"/v1/generate?words=2305843009213693951&dedup=false",
		] {
			let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
			assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		}
	}

	#[actix_web::test]
	async fn test_unknown_phonology_is_not_found() {
		let data = shared();
		let app = test::init_service(
			App::new().app_data(data.clone()).service(put_phonology).service(get_loaded_phonology),
		)
		.await;

		let request = test::TestRequest::put().uri("/v1/load_phonology?name=does_not_exist").to_request();
		let response = test::call_service(&app, request).await;
		assert_eq!(response.status(), StatusCode::NOT_FOUND);

		let request = test::TestRequest::get().uri("/v1/loaded_phonology").to_request();
		assert_eq!(test::call_and_read_body(&app, request).await, BUNDLED_NAME.as_bytes());
	}

	#[actix_web::test]
	async fn test_huge_deduplicated_batch_is_exhausted() {
		let app = test::init_service(App::new().app_data(shared()).service(get_generated)).await;

		let uri = format!("/v1/generate?words={MAX_WORDS}&syllables=1&seed=3");
		let response = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
		assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
	}

	#[actix_web::test]
	async fn test_phonology_name_cannot_leave_data_folder() {
		let data = shared();
		let app = test::init_service(
			App::new().app_data(data.clone()).service(put_phonology).service(get_loaded_phonology),
		)
		.await;

		for name in ["../x", "..", "sub/x", "sub%5Cx", "%2Fetc%2Fpasswd"] {
			let uri = format!("/v1/load_phonology?name={name}");
			let response = test::call_service(&app, test::TestRequest::put().uri(&uri).to_request()).await;
			assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name}");
		}

		let request = test::TestRequest::get().uri("/v1/loaded_phonology").to_request();
		assert_eq!(test::call_and_read_body(&app, request).await, BUNDLED_NAME.as_bytes());
	}

	#[::core::prelude::v1::test]
	fn test_valid_names() {
		assert!(is_valid_name("wizard_names"));
		assert!(is_valid_name("toki-pona2"));
		assert!(!is_valid_name("../x"));
		assert!(!is_valid_name("a.b"));
		assert!(!is_valid_name(""));
	}
}
