//! Command-line driver for the verse generator.
//!
//! Every command loads (and caches) the corpora given with `--corpus`,
//! merges them, then generates from the result. Poems, haiku and songs
//! also load the pronunciation dictionaries.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_verse_core::composer::{Composer, PoemConfig, SongTemplate};
use rs_verse_core::io::get_filename;
use rs_verse_core::model::{BigramModel, Generator, GeneratorConfig};
use rs_verse_core::model::generator_config::DEFAULT_MAX_HALF_LENGTH;
use rs_verse_core::rhyme::RhymeIndex;
use rs_verse_core::tagger::LexiconTagger;
use rs_verse_core::text::post_process;

#[derive(Parser, Debug)]
#[command(name = "rs-verse", version, about = "Markov sentences, rhyming poems, haiku and songs")]
struct Cli {
    /// Text corpora, one sentence per line. A cached `.bin` is used when present.
    #[arg(short, long, global = true, default_value = "./data/corpus.txt")]
    corpus: Vec<PathBuf>,

    /// Phoneme-class table (CMU `.phones` format).
    #[arg(long, global = true, default_value = "./data/cmudict.phones")]
    phones: PathBuf,

    /// Pronunciation dictionaries, custom ones first.
    #[arg(long = "dict", global = true, default_value = "./data/cmudict.dict")]
    dictionaries: Vec<PathBuf>,

    /// Brill-style lexicon used to judge sentence endings.
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    /// Fixed seed for reproducible output.
    #[arg(long, global = true)]
    rng_seed: Option<u64>,

    /// Soft bound of each half of a generated sentence.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_HALF_LENGTH)]
    max_half_length: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds the corpora and writes their merge to a model file.
    Build {
        /// Output model file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generates sentences, optionally around a seed word or pair.
    Sentence {
        #[arg(long)]
        seed: Option<String>,

        /// Second word of the seed pair.
        #[arg(long, requires = "seed")]
        seed2: Option<String>,

        /// Start the sentence with the seed word.
        #[arg(long, requires = "seed", conflicts_with = "seed2")]
        forwards: bool,

        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Writes a rhyming poem ending with the topic.
    Poem {
        topic: String,

        #[arg(long, default_value_t = 3)]
        lines: usize,

        /// Maximum tokens per line.
        #[arg(long, default_value_t = 6)]
        max_length: usize,
    },

    /// Writes a 5/7/5 haiku ending with the topic.
    Haiku { topic: String },

    /// Writes a song to a known tune.
    Song {
        topic: String,

        /// Preset tune, matched by (part of) its name.
        #[arg(long, default_value = "pretty woman")]
        tune: String,
    },

    /// Lists the words rhyming with a word, most specific first.
    Rhymes { word: String },
}

/// Loads and merges every corpus.
fn load_model(corpora: &[PathBuf]) -> Result<BigramModel> {
    let mut model: Option<BigramModel> = None;
    for path in corpora {
        let partial_model = BigramModel::from_corpus_file(path)
            .with_context(|| format!("Failed to load corpus {}", path.display()))?;
        info!("Loaded '{}' ({} tokens)", get_filename(path)?, partial_model.len());

        match model.as_mut() {
            Some(m) => m.merge(&partial_model),
            None => model = Some(partial_model),
        }
    }
    model.context("No corpus given")
}

fn load_rhymes(phones: &Path, dictionaries: &[PathBuf]) -> Result<RhymeIndex> {
    let rhymes = RhymeIndex::from_files(phones, dictionaries)
        .with_context(|| format!("Failed to load dictionaries with phones {}", phones.display()))?;
    rhymes.log_stats();
    Ok(rhymes)
}

fn make_generator(cli: &Cli) -> Result<Generator> {
    let model = load_model(&cli.corpus)?;
    let config = GeneratorConfig::new(cli.max_half_length, cli.rng_seed)?;
    let mut generator = Generator::new(Arc::new(model), &config);

    if let Some(path) = &cli.lexicon {
        let file = File::open(path).with_context(|| format!("Failed to open lexicon {}", path.display()))?;
        generator = generator.with_tagger(Arc::new(LexiconTagger::from_reader(BufReader::new(file))?));
    }
    Ok(generator)
}

fn make_composer(cli: &Cli) -> Result<Composer> {
    let generator = make_generator(cli)?;
    let rhymes = load_rhymes(&cli.phones, &cli.dictionaries)?;
    Ok(Composer::new(generator, Arc::new(rhymes)))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Build { out } => {
            let model = load_model(&cli.corpus)?;
            println!("{} tokens, {} distinct bigrams", model.len(), model.bigram_count());
            if let Some(out) = out {
                model.save(out).with_context(|| format!("Failed to write {}", out.display()))?;
                println!("Model written to {}", out.display());
            }
        }
        Command::Sentence { seed, seed2, forwards, count } => {
            let mut generator = make_generator(&cli)?;
            for _ in 0..*count {
                let sentence = match (seed, seed2) {
                    (Some(w1), Some(w2)) => generator.random_around_pair(w1, w2)?,
                    (Some(w1), None) if *forwards => generator.random_forwards(w1)?,
                    (Some(w1), None) => generator.random_around(w1)?,
                    (None, _) => generator.random_sentence()?,
                };
                println!("{}", post_process(&sentence));
            }
        }
        Command::Poem { topic, lines, max_length } => {
            let config = PoemConfig::new(*lines, *max_length)?;
            let mut composer = make_composer(&cli)?;
            println!("{}", composer.poem(topic, &config)?);
        }
        Command::Haiku { topic } => {
            let mut composer = make_composer(&cli)?;
            println!("{}", composer.haiku(topic)?);
        }
        Command::Song { topic, tune } => {
            let Some(template) = SongTemplate::by_name(tune) else {
                let known: Vec<String> = SongTemplate::presets().into_iter().map(|t| t.name).collect();
                bail!("Unknown tune '{tune}', try one of: {}", known.join(", "));
            };
            let mut composer = make_composer(&cli)?;
            print!("{}", composer.song(topic, &template)?);
        }
        Command::Rhymes { word } => {
            let rhymes = load_rhymes(&cli.phones, &cli.dictionaries)?;
            let mut rng = match cli.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for rhyme in rhymes.find_rhymes(word, &mut rng)? {
                println!("{rhyme}");
            }
        }
    }

    Ok(())
}
