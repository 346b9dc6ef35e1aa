use std::collections::HashMap;
use std::time::Duration;
use anyhow::{anyhow, Result};
use http::StatusCode;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};
use deferred::exec::Resolver;
use deferred::ex::fetch::{self, Request, Response};

pub const CHUNKS: u32 = 4;

pub struct StubClient {
    pages:  HashMap<String, (StatusCode, String)>,
    handle: Handle,
}

impl StubClient {
    pub fn new(handle: Handle) -> Self {
        let pages = HashMap::new();
        Self { pages, handle }
    }

    pub fn page(mut self, url: &str, status: StatusCode, body: &str) -> Self {
        self.pages.insert(url.to_owned(), (status, body.to_owned()));
        self
    }

    async fn send(page: Option<(StatusCode, String)>, request: Request, resolver: &Resolver<Response>) -> Result<Response> {
        let (status, body) = page.ok_or_else(|| anyhow!("connection refused: {}", request.url))?;

        for chunk in 1..=CHUNKS {
            sleep(Duration::from_millis(2)).await;
            resolver.notify(chunk as f32 / CHUNKS as f32)?;
        }

        Ok(Response {
            status: status,
            body:   body,
        })
    }
}

impl fetch::Client for StubClient {
    fn fetch(&self, request: Request, resolver: Resolver<Response>) {
        let page = self.pages.get(&request.url).cloned();
        self.handle.spawn(async move {
            let expiry = Duration::from_secs(10);

            let result = timeout(expiry, Self::send(page, request, &resolver)).await;

            match result {
                Ok(Ok(r))  => resolver.resolve(r),
                Ok(Err(e)) => resolver.reject(format!("{e}")),
                Err(_)     => resolver.reject("timeout"),
            }
        });
    }
}
