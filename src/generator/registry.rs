use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::generator::adaptive::AdaptiveWordSource;
use crate::generator::language::language_lines;
use crate::generator::param::StrategyParams;
use crate::generator::pool::CharPool;
use crate::generator::random::RandomLines;
use crate::generator::remote::wiki_lines;
use crate::generator::text::TextLines;
use crate::generator::typeable::{LAYOUTS, TypeableChars};
use crate::generator::word_list::WordList;
use crate::generator::{SourceError, WordSource};

#[derive(RustEmbed)]
#[folder = "assets/texts/"]
struct BundledTexts;

/// Everything a factory may need besides its own param.
#[derive(Clone, Debug)]
pub struct SourceContext {
    pub texts_dir: PathBuf,
    pub adapt_value: f64,
    pub layout: &'static TypeableChars,
    pub seed: Option<u64>,
}

impl Default for SourceContext {
    fn default() -> Self {
        Self {
            texts_dir: PathBuf::from("."),
            adapt_value: crate::generator::adaptive::DEFAULT_ADAPT_VALUE,
            layout: &LAYOUTS[0],
            seed: None,
        }
    }
}

impl SourceContext {
    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }
}

pub type Factory = fn(&StrategyParams, &SourceContext) -> Result<Box<dyn WordSource>, SourceError>;

#[derive(Clone, Copy)]
pub struct Strategy {
    pub key: &'static str,
    pub description: &'static str,
    /// Param key shown instead of the whole param, if any.
    pub display_key: Option<&'static str>,
    factory: Factory,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("key", &self.key).finish()
    }
}

pub const BUILTIN: &[Strategy] = &[
    Strategy {
        key: "generic_rand",
        description: "Random words from a character set",
        display_key: Some("chars"),
        factory: generic_rand,
    },
    Strategy {
        key: "generic_rand_lang",
        description: "Random words with capitals and punctuation",
        display_key: Some("chars"),
        factory: generic_rand_lang,
    },
    Strategy {
        key: "adapt_rand",
        description: "Random words favouring your weakest characters",
        display_key: Some("chars"),
        factory: adapt_rand,
    },
    Strategy {
        key: "adapt_rand_lang",
        description: "Random sentences favouring your weakest characters",
        display_key: Some("chars"),
        factory: adapt_rand_lang,
    },
    Strategy {
        key: "word_list",
        description: "Random words from a word list",
        display_key: Some("file_name"),
        factory: word_list,
    },
    Strategy {
        key: "text",
        description: "A text, line by line",
        display_key: Some("file_name"),
        factory: text,
    },
    Strategy {
        key: "wiki",
        description: "A random Wikipedia article",
        display_key: Some("lang"),
        factory: wiki,
    },
];

fn pool_param(params: &StrategyParams) -> Result<CharPool, SourceError> {
    let pool = CharPool::from_chars(params.require("chars")?);
    if pool.is_empty() {
        return Err(SourceError::other("strategy parameter `chars` is empty"));
    }
    Ok(pool)
}

fn generic_rand(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    Ok(Box::new(RandomLines::uniform(pool_param(params)?, ctx.rng())?))
}

fn generic_rand_lang(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    Ok(Box::new(language_lines(pool_param(params)?, ctx.rng())?))
}

fn adapt_rand(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    let inner = RandomLines::uniform(pool_param(params)?, ctx.rng())?;
    Ok(Box::new(AdaptiveWordSource::with_adapt_value(inner, ctx.adapt_value)))
}

fn adapt_rand_lang(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    let inner = language_lines(pool_param(params)?, ctx.rng())?;
    Ok(Box::new(AdaptiveWordSource::with_adapt_value(inner, ctx.adapt_value)))
}

fn word_list(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    let reader = open_text(params, ctx)?;
    Ok(Box::new(WordList::from_reader(reader, ctx.rng())?))
}

fn text(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    Ok(Box::new(TextLines::new(open_text(params, ctx)?)?))
}

fn wiki(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn WordSource>, SourceError> {
    Ok(Box::new(wiki_lines(params, ctx.layout)?))
}

/// Open `file_name`, bundled with the binary when `is_local=true`, otherwise
/// from the texts directory.
pub fn open_text(params: &StrategyParams, ctx: &SourceContext) -> Result<Box<dyn BufRead>, SourceError> {
    let file_name = params.require("file_name")?;
    if Path::new(file_name).components().count() != 1 {
        return Err(SourceError::other(format!("`{file_name}` is not a plain file name")));
    }
    if params.flag("is_local") {
        let file = BundledTexts::get(file_name).ok_or_else(|| SourceError::missing(file_name))?;
        return Ok(Box::new(Cursor::new(file.data.into_owned())));
    }
    match File::open(ctx.texts_dir.join(file_name)) {
        Ok(file) => Ok(Box::new(BufReader::new(file))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::missing(file_name)),
        Err(e) => Err(SourceError::other(format!("{file_name}: {e}"))),
    }
}

pub fn bundled_texts() -> Vec<String> {
    BundledTexts::iter().map(|name| name.into_owned()).collect()
}

/// A strategy defined by a manifest file: a built-in strategy plus default
/// params.
#[derive(Clone, Debug, Deserialize)]
pub struct ExternalStrategy {
    pub name: String,
    pub base: String,
    #[serde(default)]
    pub param: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct StrategyRegistry {
    external: Vec<ExternalStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.toml` manifest in `dir`. Broken manifests, unknown bases
    /// and names shadowing a built-in are skipped with a warning. A missing
    /// directory is not an error.
    pub fn scan_dir(&mut self, dir: &Path) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("No strategy manifests in {}: {e}", dir.display());
                return 0;
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let manifest = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| toml::from_str::<ExternalStrategy>(&s).map_err(|e| e.to_string()));
            match manifest {
                Ok(m) => {
                    if let Err(reason) = self.register(m) {
                        log::warn!("Skipping {}: {reason}", path.display());
                    } else {
                        loaded += 1;
                    }
                }
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }
        log::info!("Loaded {loaded} external strategies from {}", dir.display());
        loaded
    }

    pub fn register(&mut self, strategy: ExternalStrategy) -> Result<(), String> {
        if builtin(&strategy.name).is_some() {
            return Err(format!("`{}` is a built-in strategy", strategy.name));
        }
        if self.external.iter().any(|s| s.name == strategy.name) {
            return Err(format!("`{}` is already registered", strategy.name));
        }
        if builtin(&strategy.base).is_none() {
            return Err(format!("unknown base strategy `{}`", strategy.base));
        }
        StrategyParams::parse(&strategy.param).map_err(|e| e.to_string())?;
        self.external.push(strategy);
        Ok(())
    }

    /// Built-in keys first, then external names in load order.
    pub fn available(&self) -> Vec<&str> {
        BUILTIN
            .iter()
            .map(|s| s.key)
            .chain(self.external.iter().map(|s| s.name.as_str()))
            .collect()
    }

    pub fn description(&self, key: &str) -> Result<&str, SourceError> {
        if let Some(s) = builtin(key) {
            return Ok(s.description);
        }
        let ext = self.external(key)?;
        if ext.description.is_empty() {
            Ok(builtin(&ext.base).map(|s| s.description).unwrap_or_default())
        } else {
            Ok(&ext.description)
        }
    }

    /// Compact form of a param for listings, e.g. just the file name.
    pub fn short_param(&self, key: &str, param: &str) -> String {
        let base = builtin(key).or_else(|| self.external(key).ok().and_then(|e| builtin(&e.base)));
        let shown = base
            .and_then(|s| s.display_key)
            .and_then(|k| StrategyParams::parse(param).ok()?.get(k).map(str::to_string));
        shown.unwrap_or_else(|| param.to_string())
    }

    pub fn create(
        &self,
        key: &str,
        param: &str,
        ctx: &SourceContext,
    ) -> Result<Box<dyn WordSource>, SourceError> {
        if let Some(s) = builtin(key) {
            return (s.factory)(&StrategyParams::parse(param)?, ctx);
        }
        let ext = self.external(key)?;
        let params = StrategyParams::parse(param)?;
        let defaults = StrategyParams::parse(&ext.param)?;
        let base = builtin(&ext.base).ok_or_else(|| SourceError::NotFound(ext.base.clone()))?;
        (base.factory)(&params.with_defaults(&defaults), ctx)
    }

    fn external(&self, key: &str) -> Result<&ExternalStrategy, SourceError> {
        self.external
            .iter()
            .find(|s| s.name == key)
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }
}

fn builtin(key: &str) -> Option<&'static Strategy> {
    BUILTIN.iter().find(|s| s.key == key)
}
