//! T5-family summarization model implemented with Candle.
//!
//! Works with any checkpoint that loads as
//! [`candle_transformers::models::t5::T5ForConditionalGeneration`], including
//! mT5 variants such as `csebuetnlp/mT5_multilingual_XLSum`. Config,
//! tokenizer and weights are resolved through the Hugging Face hub cache.
//! Weights may be safetensors or a PyTorch pickle (`.bin`/`.pth`).
//!
//! Length bounds count the decoder start token, so `min_length: 30` and
//! `max_length: 150` allow 29 to 149 generated tokens.

use super::{GenerationParams, SummaryModel};
use crate::config::ModelConfig;
use crate::error::SummarizationError;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument, warn};

const SEED: u64 = 299792458;

/// A loaded encoder/decoder summarization model.
pub struct T5Summarizer {
    // Decoding mutates the model's key/value cache.
    model: Mutex<t5::T5ForConditionalGeneration>,
    config: t5::Config,
    tokenizer: Tokenizer,
    device: Device,
    prefix: String,
}

fn load_err(e: impl std::fmt::Display) -> SummarizationError {
    SummarizationError::ModelLoad(e.to_string())
}

fn inference_err(e: impl std::fmt::Display) -> SummarizationError {
    SummarizationError::Inference(e.to_string())
}

fn device(cpu: bool) -> Result<Device, SummarizationError> {
    if cpu {
        return Ok(Device::Cpu);
    }
    let device = Device::cuda_if_available(0).map_err(load_err)?;
    if !device.is_cuda() {
        debug!("Running summarization on CPU");
    }
    Ok(device)
}

/// On-disk layout of a weight file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    Safetensors,
    Pickle,
}

impl WeightFormat {
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".safetensors") {
            WeightFormat::Safetensors
        } else {
            WeightFormat::Pickle
        }
    }
}

/// Download (or reuse from the local hub cache) one file of the model.
fn hub_file(api: &Api, repo: &str, revision: &str, file: &str) -> Result<PathBuf, SummarizationError> {
    let path = api
        .repo(Repo::with_revision(
            repo.to_string(),
            RepoType::Model,
            revision.to_string(),
        ))
        .get(file)
        .map_err(|e| load_err(format!("{repo}/{file}: {e}")))?;
    debug!(%repo, %file, path = %path.display(), "Resolved model file");
    Ok(path)
}

impl T5Summarizer {
    /// Fetch and load the model described by `source`. Expensive: reads the
    /// full weight file.
    #[instrument(level = "info", skip_all, fields(repo = %source.repo))]
    pub fn load(source: &ModelConfig) -> Result<Self, SummarizationError> {
        let api = Api::new().map_err(load_err)?;
        let config_path = hub_file(&api, &source.repo, &source.revision, &source.config_file)?;
        let tokenizer_path = match &source.tokenizer_repo {
            Some(repo) => hub_file(&api, repo, &source.tokenizer_revision, &source.tokenizer_file)?,
            None => hub_file(&api, &source.repo, &source.revision, &source.tokenizer_file)?,
        };
        let weights_path = hub_file(&api, &source.repo, &source.revision, &source.weights_file)?;

        let raw = std::fs::read_to_string(&config_path).map_err(load_err)?;
        let mut config: t5::Config = serde_json::from_str(&raw).map_err(load_err)?;
        config.use_cache = true;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(load_err)?;

        let device = device(source.cpu)?;
        let vb = match WeightFormat::from_file_name(&source.weights_file) {
            WeightFormat::Safetensors => unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                    .map_err(load_err)?
            },
            WeightFormat::Pickle => {
                VarBuilder::from_pth(&weights_path, DType::F32, &device).map_err(load_err)?
            }
        };
        let model = t5::T5ForConditionalGeneration::load(vb, &config).map_err(load_err)?;
        info!(device = ?device, "Loaded T5 summarization model");

        Ok(Self {
            model: Mutex::new(model),
            config,
            tokenizer,
            device,
            prefix: source.prefix.clone(),
        })
    }

    fn decoder_start_token(&self) -> u32 {
        self.config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32
    }
}

/// Replace one logit with negative infinity so argmax never picks it.
fn suppress_token(logits: &Tensor, token: u32) -> candle_core::Result<Tensor> {
    let mut values = logits.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    if let Some(v) = values.get_mut(token as usize) {
        *v = f32::NEG_INFINITY;
    }
    Tensor::new(values.as_slice(), logits.device())
}

/// Greedy (or seeded sampling) decode driven by `step`, which maps the
/// tokens so far (starting with `start`) to next-token logits.
///
/// # Arguments
///
/// * `step` - Runs the decoder on the current sequence.
/// * `params` - Length bounds, counted including `start`.
/// * `start` - Decoder start token.
/// * `eos` - End-of-sequence token; suppressed while the sequence is shorter
///   than `params.min_length`.
///
/// # Returns
///
/// The generated tokens without `start` and without the final EOS.
pub fn decode_tokens<F>(
    mut step: F,
    params: &GenerationParams,
    start: u32,
    eos: u32,
) -> candle_core::Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> candle_core::Result<Tensor>,
{
    let temperature = params.do_sample.then_some(1.0);
    let mut logits_processor = LogitsProcessor::new(SEED, temperature, None);
    let mut ids = vec![start];

    while ids.len() < params.max_length {
        let logits = step(&ids)?;
        let logits = if ids.len() < params.min_length {
            suppress_token(&logits, eos)?
        } else {
            logits
        };
        let next = logits_processor.sample(&logits)?;
        if next == eos {
            break;
        }
        ids.push(next);
    }

    ids.remove(0);
    Ok(ids)
}

impl SummaryModel for T5Summarizer {
    #[instrument(level = "debug", skip_all, fields(chars = input.chars().count()))]
    fn generate(
        &self,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String, SummarizationError> {
        let prompt = format!("{}{}", self.prefix, input);
        let encoding = self.tokenizer.encode(prompt, true).map_err(inference_err)?;
        let input_ids = encoding.get_ids();
        if input_ids.is_empty() {
            return Err(SummarizationError::EmptyInput);
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| inference_err("model mutex poisoned"))?;
        model.clear_kv_cache();

        let input_ids = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input_ids)?;

        let use_cache = self.config.use_cache;
        let device = &self.device;
        let generated = decode_tokens(
            |ids| {
                let decoder_ids = if ids.len() == 1 || !use_cache {
                    Tensor::new(ids, device)?.unsqueeze(0)?
                } else {
                    Tensor::new(&ids[ids.len() - 1..], device)?.unsqueeze(0)?
                };
                model.decode(&decoder_ids, &encoder_output)?.squeeze(0)
            },
            params,
            self.decoder_start_token(),
            self.config.eos_token_id as u32,
        );
        model.clear_kv_cache();
        drop(model);
        let generated = generated?;

        if generated.len() + 1 >= params.max_length {
            warn!(tokens = generated.len(), "Summary hit the maximum length");
        }
        let summary = self
            .tokenizer
            .decode(&generated, true)
            .map_err(inference_err)?;
        debug!(tokens = generated.len(), "Decoded summary");
        Ok(summary.trim().to_string())
    }
}
