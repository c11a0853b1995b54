use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use photogrid_protocol::{SectionId, SegmentData};
use tracing::debug;

use crate::api::{ApiError, TimelineApi};

type SegmentsResult = Result<Rc<Vec<SegmentData>>, ApiError>;
type InFlight = Shared<LocalBoxFuture<'static, SegmentsResult>>;

/// Fetches segment data, sharing one request between all callers asking
/// for the same section while it is in flight.
///
/// The loader does not cache completed results; the timeline stores them
/// in its sections.
pub struct SegmentLoader<A> {
    api: Rc<A>,
    in_flight: RefCell<HashMap<SectionId, InFlight>>,
}

impl<A: TimelineApi + 'static> SegmentLoader<A> {
    pub fn new(api: Rc<A>) -> Self {
        Self {
            api,
            in_flight: RefCell::new(HashMap::new()),
        }
    }

    /// Join the request for `section_id`, starting it if none is running.
    pub async fn request(&self, section_id: &SectionId) -> SegmentsResult {
        let request = {
            let mut in_flight = self.in_flight.borrow_mut();
            in_flight
                .entry(section_id.clone())
                .or_insert_with(|| {
                    debug!(section = %section_id, "fetching segments");
                    let api = Rc::clone(&self.api);
                    let id = section_id.clone();
                    async move { api.fetch_segments(&id).await.map(Rc::new) }
                        .boxed_local()
                        .shared()
                })
                .clone()
        };

        let result = request.clone().await;

        // a later request may already have replaced ours
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight
            .get(section_id)
            .is_some_and(|current| Shared::ptr_eq(current, &request))
        {
            in_flight.remove(section_id);
        }
        result
    }

    /// Number of section fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }
}
