use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};

use serde::Deserialize;
use rs_verse_core::composer::{Composer, PoemConfig, SongTemplate};
use rs_verse_core::io::{list_files, normalize_folder};
use rs_verse_core::model::{BigramModel, Generator, GeneratorConfig};
use rs_verse_core::rhyme::RhymeIndex;
use rs_verse_core::text::post_process;
use rs_verse_core::VerseError;

/// Phoneme-class table expected in the data folder.
const PHONES_FILE: &str = "cmudict.phones";
/// Main dictionary, loaded after every other `.dict` file.
const MAIN_DICTIONARY: &str = "cmudict.dict";

/// Query parameters of `/v1/load_models`
#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	rng_seed: Option<u64>
}

/// Query parameters of `/v1/sentence`
#[derive(Deserialize)]
struct SentenceParams {
	seed: Option<String>,
	seed2: Option<String>,
	forwards: Option<bool>
}

/// Query parameters of `/v1/poem`
#[derive(Deserialize)]
struct PoemParams {
	topic: String,
	lines: Option<usize>,
	max_length: Option<usize>
}

#[derive(Deserialize)]
struct TopicParams {
	topic: String
}

/// Query parameters of `/v1/song`
#[derive(Deserialize)]
struct SongParams {
	topic: String,
	tune: Option<String>
}

struct SharedData {
	data_dir: PathBuf,
	rhymes: Arc<RhymeIndex>,
	composer: Option<Composer>,
	names: Vec<String>
}

/// Maps a library error to an HTTP response.
///
/// Recoverable errors mean "try another word" and are reported as 404.
fn error_response(err: &VerseError) -> HttpResponse {
	match err {
		VerseError::NoModel | VerseError::InvalidArgument { .. } => HttpResponse::BadRequest().body(err.to_string()),
		err if err.is_recoverable() => HttpResponse::NotFound().body(err.to_string()),
		err => HttpResponse::InternalServerError().body(err.to_string())
	}
}

/// Runs `compose` on the loaded composer and answers with its text.
fn with_composer<F>(data: &web::Data<Mutex<SharedData>>, compose: F) -> HttpResponse
where
	F: FnOnce(&mut Composer) -> rs_verse_core::Result<String>
{
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let result = shared_data.composer.as_mut().ok_or(VerseError::NoModel).and_then(compose);
	match result {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => error_response(&e)
	}
}

/// HTTP GET endpoint `/v1/sentence`
///
/// - No seed: a sentence around a random pair
/// - `seed`: a sentence around a random occurrence of the word
///   (starting with it when `forwards=true`)
/// - `seed` and `seed2`: a sentence around the exact pair
#[get("/v1/sentence")]
async fn get_sentence(data: web::Data<Mutex<SharedData>>, query: web::Query<SentenceParams>) -> impl Responder {
	let query = query.into_inner();
	with_composer(&data, |composer| {
		let generator = composer.generator_mut();
		let sentence = match (query.seed.as_deref(), query.seed2.as_deref()) {
			(Some(w1), Some(w2)) => generator.random_around_pair(w1, w2)?,
			(Some(w1), None) if query.forwards.unwrap_or(false) => generator.random_forwards(w1)?,
			(Some(w1), None) => generator.random_around(w1)?,
			(None, _) => generator.random_sentence()?,
		};
		Ok(post_process(&sentence))
	})
}

/// HTTP GET endpoint `/v1/poem`
#[get("/v1/poem")]
async fn get_poem(data: web::Data<Mutex<SharedData>>, query: web::Query<PoemParams>) -> impl Responder {
	let defaults = PoemConfig::default();
	let config = match PoemConfig::new(
		query.lines.unwrap_or(defaults.line_count()),
		query.max_length.unwrap_or(defaults.max_line_length())
	) {
		Ok(c) => c,
		Err(e) => return error_response(&e)
	};

	with_composer(&data, |composer| Ok(composer.poem(&query.topic, &config)?.to_string()))
}

/// HTTP GET endpoint `/v1/haiku`
#[get("/v1/haiku")]
async fn get_haiku(data: web::Data<Mutex<SharedData>>, query: web::Query<TopicParams>) -> impl Responder {
	with_composer(&data, |composer| Ok(composer.haiku(&query.topic)?.to_string()))
}

/// HTTP GET endpoint `/v1/song`
///
/// `tune` names one of the preset templates, "Oh, Pretty Woman" by default.
#[get("/v1/song")]
async fn get_song(data: web::Data<Mutex<SharedData>>, query: web::Query<SongParams>) -> impl Responder {
	let template = match query.tune.as_deref() {
		None => SongTemplate::pretty_woman(),
		Some(tune) => match SongTemplate::by_name(tune) {
			Some(t) => t,
			None => {
				let known: Vec<String> = SongTemplate::presets().into_iter().map(|t| t.name).collect();
				return HttpResponse::BadRequest().body(format!("Unknown tune, try one of: {}", known.join(", ")));
			}
		}
	};

	with_composer(&data, |composer| Ok(composer.song(&query.topic, &template)?.to_string()))
}

/// HTTP GET endpoint `/v1/rhymes`
#[get("/v1/rhymes")]
async fn get_rhymes(data: web::Data<Mutex<SharedData>>, query: web::Query<TopicParams>) -> impl Responder {
	with_composer(&data, |composer| Ok(composer.find_rhymes(&query.topic)?.join("\n")))
}

#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&data_dir, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".txt", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models")
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.names.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Replaces the loaded model by the merge of every named corpus, each
/// read from `<data>/<name>.txt` (or its cached `.bin`).
#[put("/v1/load_models")]
async fn put_model(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	let mut model: Option<BigramModel> = None;
	for name in &model_names {
		let model_path = shared_data.data_dir.join(format!("{name}.txt"));
		let partial_model = match BigramModel::from_corpus_file(&model_path) {
			Ok(m) => m,
			Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model '{name}': {e}"))
		};
		match model.as_mut() {
			Some(m) => m.merge(&partial_model),
			None => model = Some(partial_model)
		}
	}
	let Some(model) = model else {
		return HttpResponse::BadRequest().body("Missing or empty model name");
	};

	let mut config = GeneratorConfig::default();
	config.seed = query.rng_seed;
	info!("Loaded {} ({} tokens)", model_names.join(", "), model.len());
	let generator = Generator::new(Arc::new(model), &config);
	shared_data.composer = Some(Composer::new(generator, Arc::clone(&shared_data.rhymes)));
	shared_data.names = model_names.iter().map(|s| (*s).to_owned()).collect();

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Loads the rhyme index from the data folder.
///
/// Every `.dict` file is a dictionary; custom ones are loaded before
/// `cmudict.dict` so that their pronunciations come first.
fn load_rhymes(data_dir: &Path) -> rs_verse_core::Result<RhymeIndex> {
	let mut dictionaries = list_files(data_dir, "dict")?;
	dictionaries.sort_by_key(|name| name == MAIN_DICTIONARY);
	if dictionaries.is_empty() {
		warn!("No dictionary in {}, rhymes are disabled", data_dir.display());
	}

	let paths: Vec<PathBuf> = dictionaries.iter().map(|name| data_dir.join(name)).collect();
	let rhymes = RhymeIndex::from_files(data_dir.join(PHONES_FILE), &paths)?;
	rhymes.log_stats();
	Ok(rhymes)
}

/// Main entry point for the server.
///
/// Loads the rhyme index, wraps the shared state in a `Mutex` and starts
/// an Actix-web HTTP server. No model is loaded until `/v1/load_models`
/// is called.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - The data folder is `./data`, or `RS_VERSE_DATA` when set.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let data_dir = normalize_folder(&std::env::var("RS_VERSE_DATA").unwrap_or_else(|_| "./data".to_owned()));
	let rhymes = load_rhymes(&data_dir).map_err(std::io::Error::other)?;

	let shared_data = SharedData {
		data_dir,
		rhymes: Arc::new(rhymes),
		composer: None,
		names: Vec::new()
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		let cors = Cors::default()
			.allow_any_origin()
			.allow_any_header()
			.allowed_methods(vec!["GET", "PUT"]);

		App::new()
			.wrap(Logger::default())
			.wrap(cors)
			.app_data(shared_model.clone())
			.service(get_sentence)
			.service(get_poem)
			.service(get_haiku)
			.service(get_song)
			.service(get_rhymes)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
