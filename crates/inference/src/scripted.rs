//! Scripted inference client for tests.
//!
//! Outcomes are queued ahead of time; each trait call pops the next one.
//! Call counters let tests assert that rejected requests performed no
//! inference side effects.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use studio_core::character::CharacterProfile;
use studio_core::images::ImageData;

use crate::{InferenceClient, InferenceError};

#[derive(Default)]
pub struct ScriptedClient {
    profiles: Mutex<VecDeque<Result<CharacterProfile, String>>>,
    images: Mutex<VecDeque<Result<ImageData, String>>>,
    describe_calls: AtomicUsize,
    render_calls: AtomicUsize,
    last_model_override: Mutex<Option<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_profile(&self, profile: CharacterProfile) {
        self.profiles.lock().unwrap().push_back(Ok(profile));
    }

    pub fn enqueue_profile_error(&self, message: impl Into<String>) {
        self.profiles.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn enqueue_image(&self, image: ImageData) {
        self.images.lock().unwrap().push_back(Ok(image));
    }

    pub fn enqueue_image_error(&self, message: impl Into<String>) {
        self.images.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    /// Model override passed to the most recent render call.
    pub fn last_model_override(&self) -> Option<String> {
        self.last_model_override.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn describe_character(
        &self,
        _image: &ImageData,
    ) -> Result<CharacterProfile, InferenceError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        match self.profiles.lock().unwrap().pop_front() {
            Some(Ok(profile)) => Ok(profile),
            Some(Err(message)) => Err(InferenceError::Api {
                status: 500,
                message,
            }),
            None => Err(InferenceError::EmptyResponse(
                "no scripted profile queued".into(),
            )),
        }
    }

    async fn render_character(
        &self,
        _image: &ImageData,
        _prompt: &str,
        model_override: Option<&str>,
    ) -> Result<ImageData, InferenceError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model_override.lock().unwrap() = model_override.map(str::to_string);
        match self.images.lock().unwrap().pop_front() {
            Some(Ok(image)) => Ok(image),
            Some(Err(message)) => Err(InferenceError::Api {
                status: 500,
                message,
            }),
            None => Err(InferenceError::EmptyResponse(
                "no scripted image queued".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn pixel() -> ImageData {
        ImageData {
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn pops_scripted_outcomes_in_order() {
        let client = ScriptedClient::new();
        client.enqueue_profile(CharacterProfile {
            name: "A".into(),
            description: "first".into(),
            keywords: vec![],
        });
        client.enqueue_profile_error("boom");

        let first = client.describe_character(&pixel()).await.unwrap();
        assert_eq!(first.name, "A");

        let second = client.describe_character(&pixel()).await.unwrap_err();
        assert_matches!(second, InferenceError::Api { .. });
        assert_eq!(client.describe_calls(), 2);
    }

    #[tokio::test]
    async fn records_model_override() {
        let client = ScriptedClient::new();
        client.enqueue_image(pixel());

        client
            .render_character(&pixel(), "storm", Some("projects/p/models/m"))
            .await
            .unwrap();

        assert_eq!(
            client.last_model_override().as_deref(),
            Some("projects/p/models/m")
        );
    }

    #[tokio::test]
    async fn exhausted_script_is_an_empty_response() {
        let client = ScriptedClient::new();
        assert_matches!(
            client.describe_character(&pixel()).await.unwrap_err(),
            InferenceError::EmptyResponse(_)
        );
    }
}
