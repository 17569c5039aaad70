//! Test doubles for the rendered-page capability.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use crate::page_source::{document_handle, ElementHandle, RenderedPage};
use render_client::RenderError;

/// Scripted page: each navigation pops the next response (markup or error).
/// Settle waits are no-ops so simulated runs don't sleep.
#[derive(Default)]
pub struct StaticPage {
    responses: VecDeque<Result<String, RenderError>>,
    html: String,
    pub navigations: Vec<String>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_html(&mut self, html: &str) {
        self.responses.push_back(Ok(html.to_string()));
    }

    pub fn push_error(&mut self, err: RenderError) {
        self.responses.push_back(Err(err));
    }
}

#[async_trait]
impl RenderedPage for StaticPage {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> render_client::Result<()> {
        self.navigations.push(url.to_string());
        match self.responses.pop_front() {
            Some(Ok(html)) => {
                self.html = html;
                Ok(())
            }
            Some(Err(err)) => Err(err),
            None => Err(RenderError::Network("no scripted response left".into())),
        }
    }

    fn root(&self) -> ElementHandle {
        document_handle(&self.html)
    }

    fn content(&self) -> &str {
        &self.html
    }

    async fn wait(&self, _ms: u64) {}
}
