//! Generic ordered pipeline of named, cached transform stages.
//!
//! A [`TransformPipeline`] runs a fixed list of pure stages over an input.
//! Two independent caches sit on top of it:
//!
//! - the output cache maps a key to the final output, so a repeated
//!   request with the same key returns immediately without running a stage
//! - the stage cache keeps every intermediate output per key, which
//!   [`TransformPipeline::process_full`] exposes
//!
//! Both caches default to on. The decode pipelines keep them on; the encode
//! pipeline turns them off because encodes are not expected to repeat.

use std::collections::HashMap;

use log::{debug, trace};

use crate::error::{CodecError, Result};

/// Derives the default cache key of a pipeline input.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

/// What a stage sees besides the value it transforms.
pub struct StageInput<'a, C, X> {
    /// Cache key of the current run
    pub key: &'a str,
    /// Per-request extra data
    pub extra: &'a X,
    /// The pipeline's own context (palette, scale, ...)
    pub context: &'a C,
}

/// A stage procedure.
pub type StageFn<C, V, X> = fn(V, &StageInput<'_, C, X>) -> Result<V>;

struct Stage<C, V, X> {
    name: &'static str,
    run: StageFn<C, V, X>,
}

/// An ordered list of named stages with optional output and per-stage caches.
pub struct TransformPipeline<C, V, X = ()> {
    context: C,
    stages: Vec<Stage<C, V, X>>,
    cache_output: bool,
    cache_stages: bool,
    outputs: HashMap<String, V>,
    stage_outputs: HashMap<String, HashMap<&'static str, V>>,
}

impl<C, V, X> TransformPipeline<C, V, X>
where
    V: Clone + CacheKey,
{
    /// Build a pipeline running `names` in order.
    ///
    /// Every declared name must have an entry in `procedures`.
    pub fn new(
        context: C,
        names: &[&'static str],
        procedures: &[(&'static str, StageFn<C, V, X>)],
    ) -> Result<Self> {
        if names.is_empty() {
            return Err(CodecError::NoStages);
        }

        let stages = names
            .iter()
            .map(|name| {
                procedures
                    .iter()
                    .find(|(candidate, _)| candidate == name)
                    .map(|(_, run)| Stage { name: *name, run: *run })
                    .ok_or_else(|| CodecError::UnknownStage(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            context,
            stages,
            cache_output: true,
            cache_stages: true,
            outputs: HashMap::new(),
            stage_outputs: HashMap::new(),
        })
    }

    /// Enable or disable the final-output cache.
    pub fn with_output_cache(mut self, enabled: bool) -> Self {
        self.cache_output = enabled;
        self
    }

    /// Enable or disable the per-stage cache.
    pub fn with_stage_cache(mut self, enabled: bool) -> Self {
        self.cache_stages = enabled;
        self
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Run the pipeline, or return the cached output for `key`.
    ///
    /// `key` defaults to the input's own [`CacheKey`].
    pub fn process(&mut self, input: V, key: Option<&str>, extra: &X) -> Result<V> {
        if !self.cache_output && !self.cache_stages {
            let key = key.map(str::to_string).unwrap_or_default();
            return self.run_stages(input, &key, extra).map(|(output, _)| output);
        }

        let key = key.map(str::to_string).unwrap_or_else(|| input.cache_key());
        if self.cache_output {
            if let Some(cached) = self.outputs.get(&key) {
                trace!("pipeline cache hit for '{}'", key);
                return Ok(cached.clone());
            }
        }

        debug!("pipeline cache miss for '{}', running {} stages", key, self.stages.len());
        let (output, per_stage) = self.run_stages(input, &key, extra)?;
        if self.cache_stages {
            self.stage_outputs.insert(key.clone(), per_stage);
        }
        if self.cache_output {
            self.outputs.insert(key, output.clone());
        }
        Ok(output)
    }

    /// Like [`process`](Self::process), returning every stage's output by name.
    pub fn process_full(
        &mut self,
        input: V,
        key: Option<&str>,
        extra: &X,
    ) -> Result<HashMap<&'static str, V>> {
        if !self.cache_stages {
            return Err(CodecError::StageCacheDisabled);
        }
        let key = key.map(str::to_string).unwrap_or_else(|| input.cache_key());
        if !self.stage_outputs.contains_key(&key) {
            let (output, per_stage) = self.run_stages(input, &key, extra)?;
            self.stage_outputs.insert(key.clone(), per_stage);
            if self.cache_output {
                self.outputs.insert(key.clone(), output);
            }
        }
        Ok(self.stage_outputs.get(&key).cloned().unwrap_or_default())
    }

    /// Whether a final output is cached under `key`.
    pub fn is_cached(&self, key: &str) -> bool {
        self.outputs.contains_key(key)
    }

    /// Number of cached final outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Drop every cached output.
    pub fn clear(&mut self) {
        self.outputs.clear();
        self.stage_outputs.clear();
    }

    fn run_stages(
        &self,
        input: V,
        key: &str,
        extra: &X,
    ) -> Result<(V, HashMap<&'static str, V>)> {
        let stage_input = StageInput { key, extra, context: &self.context };
        let mut per_stage = HashMap::new();
        let mut value = input;
        for stage in &self.stages {
            trace!("stage '{}' for '{}'", stage.name, key);
            value = (stage.run)(value, &stage_input)?;
            if self.cache_stages {
                per_stage.insert(stage.name, value.clone());
            }
        }
        Ok((value, per_stage))
    }
}
