use encoding_rs::{DecoderResult, EncoderResult, Encoding};
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use taberr_core::{Column, Value};
use taberr_plan::types::{MOJIBAKE_ENCODINGS, incompatible_encodings};
use taberr_plan::{ErrorTypeConfig, MojibakeConfig};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Encodes flagged text with one encoding and decodes it with another.
/// Characters the sender cannot encode and bytes the receiver cannot decode
/// are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mojibake {
    pub config: MojibakeConfig,
    pub seed: Option<u64>,
}

impl Mojibake {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            config: MojibakeConfig {
                encoding_sender: Some(sender.into()),
                encoding_receiver: Some(receiver.into()),
            },
            seed: None,
        }
    }

    /// Configured pair, or a random sender with an incompatible receiver.
    fn encodings(&self, rng: &mut ChaCha8Rng) -> Result<(String, String)> {
        if let (Some(sender), Some(receiver)) =
            (&self.config.encoding_sender, &self.config.encoding_receiver)
        {
            return Ok((sender.clone(), receiver.clone()));
        }
        let sender = MOJIBAKE_ENCODINGS
            .choose(rng)
            .ok_or_else(|| InjectError::Config("no encodings to choose from".to_string()))?;
        let receiver = incompatible_encodings(sender)
            .choose(rng)
            .copied()
            .ok_or_else(|| {
                InjectError::Config(format!("no incompatible encoding for '{sender}'"))
            })?;
        Ok((sender.to_string(), receiver.to_string()))
    }
}

impl ErrorType for Mojibake {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Mojibake(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        let (sender, receiver) = self.encodings(rng)?;
        let encoder = lookup(&sender)?;
        let decoder = lookup(&receiver)?;
        debug!(
            column = %column.name,
            sender = %sender,
            receiver = %receiver,
            "mojibake encodings"
        );

        map_rows(column, rows, |value| {
            let Some(text) = value.as_str() else {
                return Ok(None);
            };
            let bytes = encode_lossy(encoder, text);
            Ok(Some(Value::Text(decode_lossy(decoder, &bytes))))
        })
    }
}

fn lookup(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| InjectError::Config(format!("unknown encoding '{label}'")))
}

fn encode_lossy(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut output = Vec::with_capacity(text.len() + 16);
    let mut input = text;
    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(input.len())
            .unwrap_or(input.len() * 4 + 16);
        output.reserve(needed);
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(input, &mut output, true);
        input = &input[read..];
        match result {
            EncoderResult::InputEmpty => return output,
            EncoderResult::OutputFull | EncoderResult::Unmappable(_) => {}
        }
    }
}

fn decode_lossy(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut output = String::with_capacity(bytes.len() * 2 + 16);
    let mut input = bytes;
    loop {
        let needed = decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .unwrap_or(input.len() * 3 + 16);
        output.reserve(needed);
        let (result, read) =
            decoder.decode_to_string_without_replacement(input, &mut output, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => return output,
            DecoderResult::OutputFull | DecoderResult::Malformed(_, _) => {}
        }
    }
}
