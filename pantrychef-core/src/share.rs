//! Share links: a whole generation result packed into one URL query parameter.
//!
//! Token format is JSON, DEFLATE-compressed, then base64 with the URL-safe
//! alphabet and no padding. Images travel inline as data URLs, so a token is
//! self-contained and decoding needs no network or storage access.

use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use url::Url;

use crate::error::{DecodingError, EncodingError};
use crate::types::GenerationResult;

/// Query parameter that carries a share token.
pub const SHARE_QUERY_PARAM: &str = "recipe";

/// Default upper bound on token length, in bytes.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 2 * 1024 * 1024;

/// Inflated payloads may be at most this many times the token limit.
const MAX_INFLATE_RATIO: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareCodec {
    max_token_len: usize,
}

impl Default for ShareCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKEN_LEN)
    }
}

impl ShareCodec {
    pub fn new(max_token_len: usize) -> Self {
        Self { max_token_len }
    }

    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    /// Largest JSON payload a token may inflate to. Both directions enforce it.
    pub fn max_payload_len(&self) -> usize {
        self.max_token_len.saturating_mul(MAX_INFLATE_RATIO)
    }

    /// Pack `result` into a URL-safe token.
    pub fn encode(&self, result: &GenerationResult) -> Result<String, EncodingError> {
        let json = serde_json::to_vec(result)?;
        if json.len() > self.max_payload_len() {
            return Err(EncodingError::TooLarge {
                size: json.len(),
                limit: self.max_payload_len(),
            });
        }

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;

        let token = URL_SAFE_NO_PAD.encode(compressed);
        if token.len() > self.max_token_len {
            return Err(EncodingError::TooLarge {
                size: token.len(),
                limit: self.max_token_len,
            });
        }

        tracing::debug!(
            json_bytes = json.len(),
            token_bytes = token.len(),
            "Encoded share token"
        );
        Ok(token)
    }

    /// Unpack a token produced by [`ShareCodec::encode`].
    pub fn decode(&self, token: &str) -> Result<GenerationResult, DecodingError> {
        let compressed = URL_SAFE_NO_PAD.decode(token.trim())?;

        let limit = self.max_payload_len();
        let mut json = Vec::new();
        DeflateDecoder::new(compressed.as_slice())
            .take(limit as u64 + 1)
            .read_to_end(&mut json)
            .map_err(DecodingError::Decompress)?;
        if json.len() > limit {
            return Err(DecodingError::Decompress(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("inflated payload exceeds {} bytes", limit),
            )));
        }

        let result: GenerationResult = serde_json::from_slice(&json)?;

        if let Some(field) = result.recipe.shape_error() {
            return Err(DecodingError::IncompleteRecipe(field));
        }
        if !result.is_consistent() {
            return Err(DecodingError::MismatchedImages {
                images: result.instruction_images.len(),
                instructions: result.recipe.instructions.len(),
            });
        }

        Ok(result)
    }
}

/// `base` with the share token set as its query parameter.
pub fn share_url(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SHARE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(SHARE_QUERY_PARAM, token);
    url
}

/// Remove the share token from `url` and return it.
///
/// The token is consumed once: afterwards `url` no longer carries it, and other
/// query parameters are left in place.
pub fn take_shared_token(url: &mut Url) -> Option<String> {
    let mut token = None;
    let mut kept = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == SHARE_QUERY_PARAM {
            if token.is_none() {
                token = Some(value.into_owned());
            }
        } else {
            kept.push((key.into_owned(), value.into_owned()));
        }
    }

    if token.is_none() {
        return None;
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeneratedImage, Recipe};

    fn result() -> GenerationResult {
        GenerationResult {
            recipe: Recipe {
                name: "Simple Pancakes".to_string(),
                description: "Fluffy & golden".to_string(),
                prep_time: "5 minutes".to_string(),
                cook_time: "10 minutes".to_string(),
                servings: "2 servings".to_string(),
                ingredients: vec!["3 eggs".to_string(), "1 cup flour".to_string()],
                instructions: vec!["Whisk.".to_string(), "Fold.".to_string(), "Fry.".to_string()],
            },
            hero_image: None,
            instruction_images: vec![
                Some(GeneratedImage::png(vec![1, 2, 3])),
                None,
                Some(GeneratedImage::new("image/jpeg", vec![4, 5])),
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = ShareCodec::default();
        let token = codec.encode(&result()).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(codec.decode(&token).unwrap(), result());
    }

    #[test]
    fn test_corrupted_token() {
        let codec = ShareCodec::default();
        assert!(matches!(
            codec.decode("not a token!"),
            Err(DecodingError::InvalidBase64(_))
        ));

        let mut token = codec.encode(&result()).unwrap();
        token.truncate(token.len() / 2);
        assert!(codec.decode(&token).is_err());
    }

    #[test]
    fn test_valid_compression_but_not_a_recipe() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"hello": "world"}"#).unwrap();
        let token = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());

        assert!(matches!(
            ShareCodec::default().decode(&token),
            Err(DecodingError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_mismatched_images_rejected() {
        let mut shared = result();
        shared.instruction_images.pop();
        let codec = ShareCodec::default();
        let token = codec.encode(&shared).unwrap();

        assert!(matches!(
            codec.decode(&token),
            Err(DecodingError::MismatchedImages {
                images: 2,
                instructions: 3
            })
        ));
    }

    #[test]
    fn test_too_large() {
        // Noise barely compresses, so the token outgrows its limit first
        let mut seed: u32 = 12345;
        let noise: Vec<u8> = (0..4096)
            .map(|_| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (seed >> 16) as u8
            })
            .collect();
        let mut shared = result();
        shared.hero_image = Some(GeneratedImage::png(noise));

        let codec = ShareCodec::new(4096);
        assert!(matches!(
            codec.encode(&shared),
            Err(EncodingError::TooLarge { limit: 4096, .. })
        ));
    }

    #[test]
    fn test_compressible_payload_over_inflate_limit() {
        let codec = ShareCodec::new(1024);
        let mut shared = result();
        shared.hero_image = Some(GeneratedImage::png(vec![0; 16 * 1024]));

        // Zeros compress to well under the token limit, but decode could not inflate them
        assert!(matches!(
            codec.encode(&shared),
            Err(EncodingError::TooLarge { limit: 8192, .. })
        ));

        // Anything encode accepts decodes back
        let token = codec.encode(&result()).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), result());
    }

    #[test]
    fn test_share_url_and_take() {
        let base = Url::parse("http://localhost:3000/?theme=dark").unwrap();
        let mut url = share_url(&base, "abc-_123");
        assert_eq!(url.as_str(), "http://localhost:3000/?theme=dark&recipe=abc-_123");

        assert_eq!(take_shared_token(&mut url).as_deref(), Some("abc-_123"));
        assert_eq!(url.as_str(), "http://localhost:3000/?theme=dark");
        assert_eq!(take_shared_token(&mut url), None);
    }

    #[test]
    fn test_take_strips_empty_query() {
        let mut url = Url::parse("http://localhost:3000/?recipe=xyz").unwrap();
        assert_eq!(take_shared_token(&mut url).as_deref(), Some("xyz"));
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }
}
