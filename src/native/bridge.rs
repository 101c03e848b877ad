//! In-process page bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::join_all;
use log::debug;

use crate::error_handling::HostError;
use crate::host::{FrameTarget, PageBridge};
use crate::models::TabId;
use crate::page::{PageAgent, PageCall, PageReply, PageRuntime};

/// Open tabs, each a list of frame agents with the top-level document first.
pub struct LocalBridge<R> {
    tabs: RwLock<HashMap<TabId, Vec<Arc<PageAgent<R>>>>>,
    next_tab: AtomicU32,
}

impl<R> Default for LocalBridge<R> {
    fn default() -> Self {
        Self {
            tabs: RwLock::new(HashMap::new()),
            next_tab: AtomicU32::new(1),
        }
    }
}

impl<R: PageRuntime + 'static> LocalBridge<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tab whose top-level document is `top`, followed by `frames`.
    pub fn open_tab(&self, top: R, frames: Vec<R>) -> TabId {
        let tab = TabId(self.next_tab.fetch_add(1, Ordering::Relaxed));
        let agents = std::iter::once(top)
            .chain(frames)
            .map(|runtime| Arc::new(PageAgent::new(runtime)))
            .collect();
        if let Ok(mut tabs) = self.tabs.write() {
            tabs.insert(tab, agents);
        }
        tab
    }

    pub fn close_tab(&self, tab: TabId) -> bool {
        self.tabs
            .write()
            .map(|mut tabs| tabs.remove(&tab).is_some())
            .unwrap_or(false)
    }

    fn frames(&self, tab: TabId) -> Option<Vec<Arc<PageAgent<R>>>> {
        self.tabs.read().ok()?.get(&tab).cloned()
    }
}

#[async_trait]
impl<R: PageRuntime + 'static> PageBridge for LocalBridge<R> {
    async fn run_in_page(
        &self,
        tab: TabId,
        target: FrameTarget,
        call: PageCall,
    ) -> Result<Vec<PageReply>, HostError> {
        let frames = self.frames(tab).ok_or(HostError::TabClosed(tab))?;
        let frames = match target {
            FrameTarget::Top => frames.into_iter().take(1).collect::<Vec<_>>(),
            FrameTarget::AllFrames => frames,
        };

        let results = join_all(frames.iter().map(|agent| agent.handle(call.clone()))).await;

        // A frame that refuses the call is dropped; the call only fails when
        // no frame answered.
        let mut replies = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    debug!("Frame {} of {} failed {}: {}", index, tab, call.op.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) if replies.is_empty() => Err(e),
            _ => Ok(replies),
        }
    }
}
