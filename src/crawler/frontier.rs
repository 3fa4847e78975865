//! Frontier for managing the crawl queue and page budget
//!
//! This module handles:
//! - The visit state of every canonical URL seen during the crawl
//! - FIFO work queue of pending URLs
//! - Linearizable claim-and-mark so no page is fetched twice
//! - The page budget and quiescence detection

use crate::state::VisitState;
use crate::url::CanonicalUrl;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// A URL claimed by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedUrl {
    /// The URL to fetch
    pub url: CanonicalUrl,

    /// Claim sequence number, used as the page id of every artifact
    pub page_id: u64,
}

#[derive(Debug, Default)]
struct FrontierState {
    visits: HashMap<CanonicalUrl, VisitState>,
    queue: VecDeque<CanonicalUrl>,
    in_flight: usize,
    claimed: u64,
}

/// Frontier manages the visit state map, the work queue and the budget
///
/// All mutations go through a single mutex that is never held across an
/// `.await`. Idle workers park on a [`Notify`] and are woken by `enqueue`
/// and `complete`.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    budget: u64,
}

impl Frontier {
    /// Creates an empty frontier with the given page budget
    pub fn new(budget: u64) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
            budget,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims a URL for fetching if it is unseen or pending and budget remains
    ///
    /// Returns the claim on success. The check and the state change happen
    /// under one lock, so concurrent callers claiming the same URL see
    /// exactly one success.
    pub fn try_claim(&self, url: &CanonicalUrl) -> Option<ClaimedUrl> {
        let mut state = self.lock();
        Self::claim_locked(&mut state, self.budget, url)
    }

    fn claim_locked(
        state: &mut FrontierState,
        budget: u64,
        url: &CanonicalUrl,
    ) -> Option<ClaimedUrl> {
        if state.claimed >= budget {
            return None;
        }

        match state.visits.get(url) {
            Some(visit) if !visit.is_claimable() => return None,
            _ => {}
        }

        state.visits.insert(url.clone(), VisitState::InFlight);
        state.in_flight += 1;
        state.claimed += 1;

        Some(ClaimedUrl {
            url: url.clone(),
            page_id: state.claimed,
        })
    }

    /// Offers discovered URLs to the frontier
    ///
    /// URLs already seen in any state are dropped, as is everything once the
    /// budget is exhausted. Returns the number of URLs newly queued.
    pub fn enqueue<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = CanonicalUrl>,
    {
        let added = {
            let mut state = self.lock();
            if state.claimed >= self.budget {
                return 0;
            }

            let mut added = 0;
            for url in urls {
                if state.visits.contains_key(&url) {
                    continue;
                }
                state.visits.insert(url.clone(), VisitState::Pending);
                state.queue.push_back(url);
                added += 1;
            }
            added
        };

        if added > 0 {
            self.notify.notify_waiters();
        }
        added
    }

    /// Marks a claimed URL as done and wakes idle workers
    pub fn complete(&self, url: &CanonicalUrl) {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            if let Some(visit) = state.visits.get_mut(url) {
                if visit.can_transition_to(VisitState::Done) {
                    *visit = VisitState::Done;
                    state.in_flight = state.in_flight.saturating_sub(1);
                } else {
                    tracing::warn!("Completed {} from state {}", url, visit);
                }
            }
        }
        self.notify.notify_waiters();
    }

    /// Waits for the next claimable URL
    ///
    /// Returns `None` once the budget is exhausted, or at quiescence: the
    /// queue is empty and no URL is in flight, so no more work can appear.
    pub async fn next(&self) -> Option<ClaimedUrl> {
        loop {
            // Register interest before inspecting the state, so a wakeup
            // between the check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.claimed >= self.budget {
                    return None;
                }

                while let Some(url) = state.queue.pop_front() {
                    if let Some(claim) = Self::claim_locked(&mut state, self.budget, &url) {
                        return Some(claim);
                    }
                }

                if state.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    pub fn state_of(&self, url: &CanonicalUrl) -> Option<VisitState> {
        self.lock().visits.get(url).copied()
    }

    /// Number of URLs claimed so far (in flight or done)
    pub fn claimed(&self) -> u64 {
        self.lock().claimed
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of distinct URLs seen in any state
    pub fn seen(&self) -> usize {
        self.lock().visits.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.lock().claimed >= self.budget
    }
}
