// In-crate fakes for the page, fetcher and proxy seams.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::control::proxy::BlackholeProxy;
use crate::dom::{Document, DomNode, NodeKind, SubtreeAccess, VideoElement};
use crate::error::{AdSkipError, Result};
use crate::hls::fetcher::PlaylistFetcher;

/// Fetcher that answers every request with one canned response.
#[derive(Clone)]
pub struct StaticFetcher {
    response: Arc<Mutex<std::result::Result<String, StatusCode>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn ok(body: &str) -> Self {
        Self::with_response(Ok(body.to_owned()))
    }

    pub fn status(status: StatusCode) -> Self {
        Self::with_response(Err(status))
    }

    fn with_response(response: std::result::Result<String, StatusCode>) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn respond_with(&self, response: std::result::Result<String, StatusCode>) {
        *self.response.lock() = response;
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PlaylistFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().push(url.to_owned());
        self.response
            .lock()
            .clone()
            .map_err(|status| AdSkipError::http_status(status, url))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoCall {
    Pause,
    SetSource(String),
    Load,
    Play,
}

struct VideoState {
    source: Option<String>,
    duration: f64,
    current_time: f64,
    attached: bool,
    refuse_play: bool,
    calls: Vec<VideoCall>,
}

pub struct FakeVideo {
    id: String,
    state: Mutex<VideoState>,
}

impl FakeVideo {
    pub fn new(id: &str, source: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            state: Mutex::new(VideoState {
                source: (!source.is_empty()).then(|| source.to_owned()),
                duration: f64::NAN,
                current_time: 0.0,
                attached: true,
                refuse_play: false,
                calls: Vec::new(),
            }),
        })
    }

    /// Player-visible calls. `set_current_time` is tracked separately.
    pub fn calls(&self) -> Vec<VideoCall> {
        self.state.lock().calls.clone()
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    pub fn set_timing(&self, duration: f64, current_time: f64) {
        let mut state = self.state.lock();
        state.duration = duration;
        state.current_time = current_time;
    }

    pub fn refuse_play(&self) {
        self.state.lock().refuse_play = true;
    }

    pub fn detach(&self) {
        self.state.lock().attached = false;
    }

    pub fn reattach(&self) {
        self.state.lock().attached = true;
    }
}

#[async_trait]
impl VideoElement for FakeVideo {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn current_source(&self) -> Option<String> {
        self.source()
    }

    fn set_source(&self, url: &str) {
        let mut state = self.state.lock();
        state.source = Some(url.to_owned());
        state.calls.push(VideoCall::SetSource(url.to_owned()));
    }

    fn pause(&self) {
        self.state.lock().calls.push(VideoCall::Pause);
    }

    fn load(&self) {
        self.state.lock().calls.push(VideoCall::Load);
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(VideoCall::Play);
        if state.refuse_play {
            return Err(AdSkipError::playback("play() requires a user gesture"));
        }
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, secs: f64) {
        self.state.lock().current_time = secs;
    }

    fn is_attached(&self) -> bool {
        self.state.lock().attached
    }
}

/// Static DOM node built with [`FakeNode::element`] and friends.
pub struct FakeNode {
    kind: NodeKind,
    tag: Option<String>,
    text: Option<String>,
    class: Option<String>,
    children: Vec<Arc<dyn DomNode>>,
    shadow: Option<Arc<dyn DomNode>>,
    frame: Option<Option<Arc<dyn DomNode>>>,
    video: Option<Arc<dyn VideoElement>>,
}

impl FakeNode {
    fn blank(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            text: None,
            class: None,
            children: Vec::new(),
            shadow: None,
            frame: None,
            video: None,
        }
    }

    pub fn element(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_owned()),
            ..Self::blank(NodeKind::Element)
        }
    }

    pub fn text_node(text: &str) -> Arc<dyn DomNode> {
        Arc::new(Self {
            text: Some(text.to_owned()),
            ..Self::blank(NodeKind::Text)
        })
    }

    pub fn fragment(children: Vec<Arc<dyn DomNode>>) -> Arc<dyn DomNode> {
        Arc::new(Self {
            children,
            ..Self::blank(NodeKind::Fragment)
        })
    }

    pub fn video(video: Arc<FakeVideo>) -> Arc<dyn DomNode> {
        Arc::new(Self {
            video: Some(video),
            ..Self::element("VIDEO")
        })
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_owned());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_owned());
        self
    }

    pub fn child(mut self, child: Arc<dyn DomNode>) -> Self {
        self.children.push(child);
        self
    }

    pub fn shadow(mut self, root: Arc<dyn DomNode>) -> Self {
        self.shadow = Some(root);
        self
    }

    /// Embed a document; `None` makes it cross-origin.
    pub fn frame(mut self, document: Option<Arc<dyn DomNode>>) -> Self {
        self.frame = Some(document);
        self
    }

    pub fn build(self) -> Arc<dyn DomNode> {
        Arc::new(self)
    }
}

impl DomNode for FakeNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn tag_name(&self) -> Option<String> {
        self.tag.clone()
    }

    fn rendered_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn class_name(&self) -> Option<String> {
        self.class.clone()
    }

    fn children(&self) -> Vec<Arc<dyn DomNode>> {
        self.children.clone()
    }

    fn shadow_root(&self) -> Option<Arc<dyn DomNode>> {
        self.shadow.clone()
    }

    fn embedded_document(&self) -> SubtreeAccess {
        match &self.frame {
            None => SubtreeAccess::Absent,
            Some(None) => SubtreeAccess::Restricted,
            Some(Some(document)) => SubtreeAccess::Accessible(Arc::clone(document)),
        }
    }

    fn as_video(&self) -> Option<Arc<dyn VideoElement>> {
        self.video.clone()
    }
}

pub struct FakeDocument {
    videos: Vec<Arc<dyn VideoElement>>,
    selectors: HashMap<String, Arc<dyn DomNode>>,
}

impl FakeDocument {
    pub fn with_videos(videos: Vec<Arc<dyn VideoElement>>) -> Self {
        Self {
            videos,
            selectors: HashMap::new(),
        }
    }

    pub fn with_selector(mut self, selector: &str, node: Arc<dyn DomNode>) -> Self {
        self.selectors.insert(selector.to_owned(), node);
        self
    }
}

impl Document for FakeDocument {
    fn videos(&self) -> Vec<Arc<dyn VideoElement>> {
        self.videos.clone()
    }

    fn query_selector(&self, selector: &str) -> Option<Arc<dyn DomNode>> {
        self.selectors.get(selector).cloned()
    }
}

/// Proxy that records the installed script and can be told to fail.
#[derive(Default)]
pub struct FakeProxy {
    installed: Mutex<Option<String>>,
    failure: Mutex<Option<String>>,
}

impl FakeProxy {
    pub fn installed(&self) -> Option<String> {
        self.installed.lock().clone()
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock() = Some(reason.to_owned());
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().as_ref() {
            Some(reason) => Err(AdSkipError::proxy(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlackholeProxy for FakeProxy {
    async fn enable(&self, pac_script: &str) -> Result<()> {
        self.check()?;
        *self.installed.lock() = Some(pac_script.to_owned());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check()?;
        *self.installed.lock() = None;
        Ok(())
    }
}
