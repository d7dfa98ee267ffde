//! テスト用のブラウザセッション

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, SessionLauncher};

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub attrs: HashMap<String, String>,
    pub text: Option<String>,
}

impl FakeNode {
    pub fn link(title: &str, href: &str) -> Self {
        let attrs = [("title", title), ("href", href)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            attrs,
            text: Some(title.to_string()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            attrs: HashMap::new(),
            text: Some(text.to_string()),
        }
    }

    /// テキストを持たない要素
    pub fn empty() -> Self {
        Self::default()
    }
}

/// セレクタ → 子要素
#[derive(Debug, Clone, Default)]
pub struct FakeContainer {
    pub children: HashMap<String, Vec<FakeNode>>,
}

impl FakeContainer {
    pub fn with(mut self, selector: &str, node: FakeNode) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(node);
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.children.remove(selector);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub url: String,
    pub container_selector: String,
    pub containers: Vec<FakeContainer>,
    /// コンテナが見えるようになるまでのポーリング回数
    pub appear_after_polls: usize,
    pub fail_navigation: bool,
}

impl FakePage {
    /// books.toscrape.com 風のページ（`n` 件）
    pub fn books(n: usize) -> Self {
        let containers = (0..n)
            .map(|i| {
                FakeContainer::default()
                    .with(
                        "h3 a",
                        FakeNode::link(
                            &format!("Book {}", i),
                            &format!("catalogue/book-{}_{}/index.html", i, 1000 + i),
                        ),
                    )
                    .with("p.price_color", FakeNode::text(&format!(" £{}.99 ", 10 + i)))
            })
            .collect();

        Self {
            url: "http://books.toscrape.com/".to_string(),
            container_selector: "article.product_pod".to_string(),
            containers,
            appear_after_polls: 0,
            fail_navigation: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FakeElement {
    Container(usize),
    Node(FakeNode),
}

/// 起動回数・終了回数を数えるランチャー
#[derive(Clone)]
pub struct FakeLauncher {
    page: Arc<FakePage>,
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(page),
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// `release()` されるまで遷移をブロックする
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, _config: &ScraperConfig) -> Result<FakeSession, ScraperError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            page: self.page.clone(),
            closes: self.closes.clone(),
            gate: self.gate.clone(),
            polls: AtomicUsize::new(0),
            navigated: false,
        })
    }
}

pub struct FakeSession {
    page: Arc<FakePage>,
    closes: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
    polls: AtomicUsize,
    navigated: bool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| ScraperError::PageLoad(e.to_string()))?;
            permit.forget();
        }
        if self.page.fail_navigation {
            return Err(ScraperError::PageLoad(format!("{}: net::ERR_NAME_NOT_RESOLVED", url)));
        }
        self.navigated = true;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self.page.url.clone())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, ScraperError> {
        if !self.navigated || selector != self.page.container_selector {
            return Ok(Vec::new());
        }
        let polls = self.polls.fetch_add(1, Ordering::SeqCst);
        if polls < self.page.appear_after_polls {
            return Ok(Vec::new());
        }
        Ok((0..self.page.containers.len())
            .map(FakeElement::Container)
            .collect())
    }

    async fn find_within(
        &self,
        parent: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, ScraperError> {
        match parent {
            FakeElement::Container(i) => Ok(self.page.containers[*i]
                .children
                .get(selector)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(FakeElement::Node)
                .collect()),
            FakeElement::Node(_) => Ok(Vec::new()),
        }
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        match element {
            FakeElement::Node(node) => Ok(node.attrs.get(name).cloned()),
            FakeElement::Container(_) => Ok(None),
        }
    }

    async fn text(&self, element: &FakeElement) -> Result<Option<String>, ScraperError> {
        match element {
            FakeElement::Node(node) => Ok(node.text.clone()),
            FakeElement::Container(_) => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
