use crate::gemini::{ContentGenerator, FileStager};
use crate::media::Payload;
use crate::models::{GenerationRequest, UploadReference, Workload};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// In-memory [`FileStager`] that hands back a fixed reference.
#[derive(Clone)]
pub struct MockFileStager {
    reference: UploadReference,
    failure: Option<String>,
    staged_paths: Arc<Mutex<Vec<PathBuf>>>,
    delete_count: Arc<Mutex<usize>>,
}

impl MockFileStager {
    pub fn new(reference: UploadReference) -> Self {
        Self {
            reference,
            failure: None,
            staged_paths: Arc::new(Mutex::new(Vec::new())),
            delete_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Make every `stage` call fail with a transport error.
    pub fn with_failure(mut self, message: String) -> Self {
        self.failure = Some(message);
        self
    }

    pub fn get_stage_count(&self) -> usize {
        self.staged_paths.lock().unwrap().len()
    }

    /// Local paths of the payloads seen by `stage`.
    pub fn get_staged_paths(&self) -> Vec<PathBuf> {
        self.staged_paths.lock().unwrap().clone()
    }

    pub fn get_delete_count(&self) -> usize {
        *self.delete_count.lock().unwrap()
    }
}

#[async_trait]
impl FileStager for MockFileStager {
    async fn stage(&self, payload: &Payload) -> Result<UploadReference> {
        self.staged_paths
            .lock()
            .unwrap()
            .push(payload.path().to_path_buf());

        match &self.failure {
            Some(message) => Err(Error::Transport(message.clone())),
            None => Ok(self.reference.clone()),
        }
    }

    async fn delete(&self, _reference: &UploadReference) -> Result<()> {
        *self.delete_count.lock().unwrap() += 1;
        Ok(())
    }
}

/// [`ContentGenerator`] that cycles through canned responses and records
/// every request it receives.
#[derive(Clone)]
pub struct MockContentGenerator {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<(GenerationRequest, Workload)>>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Make every `generate` call fail with an upstream format error.
    pub fn with_failure(mut self, message: String) -> Self {
        self.failure = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<(GenerationRequest, Workload)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn generate(&self, request: &GenerationRequest, workload: Workload) -> Result<String> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((request.clone(), workload));
            requests.len()
        };

        if let Some(message) = &self.failure {
            return Err(Error::UpstreamFormat(message.clone()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(String::new())
        } else {
            Ok(responses[(count - 1) % responses.len()].clone())
        }
    }
}
