use crate::{browser::{ListenerGuard, Page},
            comments::{config::HarvestConfig,
                       converge::{ConvergenceDriver, StopReason},
                       dom,
                       harvest::{NetworkHarvester, ResponseFilter},
                       record::CommentRecord,
                       scripts},
            error::Result};

/// Name the harvesting listener is registered under
pub const LISTENER_NAME: &str = "comment-harvester";

/// Where the records of a visit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Intercepted comment API payloads
    Network,
    /// Rendered markup, because no payload was captured
    Dom,
    /// Neither source produced a comment
    Empty,
}

/// Result of visiting one page
#[derive(Debug, Clone)]
pub struct VisitOutcome {
    pub records: Vec<CommentRecord>,
    pub source: RecordSource,
    pub rounds: u32,
    pub stop_reason: StopReason,
    pub visible_count: usize,
}

/// Harvest the comments of one page
///
/// The response listener is attached before navigation and detached only after
/// the interaction loop has finished, so the comment fetch fired by the page load
/// itself is captured. A comment request of the previously visited page that
/// completes after attaching is captured too and merged into this visit.
/// The DOM is read only when the network produced nothing.
pub fn visit_page<P: Page + ?Sized>(page: &P, url: &str, config: &HarvestConfig) -> Result<VisitOutcome> {
    let mut harvester = NetworkHarvester::new(ResponseFilter::new(&config.endpoint_pattern), config.max_json_depth);
    let listener = ListenerGuard::attach(page, LISTENER_NAME, harvester.listener())?;

    page.navigate(url)?;
    dismiss_overlays(page);
    open_comment_panel(page, config);

    let report = ConvergenceDriver::new(config).run(page, |round, count| {
        let added = harvester.collect();
        log::debug!(
            "Round {}: {} visible, {} new from network ({} total)",
            round,
            count,
            added,
            harvester.bag().len()
        );
    });

    listener.detach()?;
    let payloads = harvester.payloads();
    let bag = harvester.into_bag();

    let (records, source) = if !bag.is_empty() {
        log::debug!("{} comments from {} payloads", bag.len(), payloads);
        (bag.into_records(), RecordSource::Network)
    } else {
        let records = dom::extract_comments(page)?;
        let source = if records.is_empty() { RecordSource::Empty } else { RecordSource::Dom };
        (records, source)
    };

    Ok(VisitOutcome {
        records,
        source,
        rounds: report.rounds,
        stop_reason: report.reason,
        visible_count: report.last_count,
    })
}

/// Close cookie banners and modal prompts; nothing here is required to succeed
pub fn dismiss_overlays<P: Page + ?Sized>(page: &P) {
    if let Err(e) = page.press_key("Escape") {
        log::debug!("Escape press failed: {}", e);
    }

    match page.evaluate(scripts::DISMISS_OVERLAYS) {
        Ok(clicked) if clicked.as_u64().unwrap_or(0) > 0 => log::debug!("Dismissed {} overlay buttons", clicked),
        Ok(_) => {}
        Err(e) => log::debug!("Overlay dismissal failed: {}", e),
    }
}

/// Open a collapsed comment panel by clicking the first comment icon found
pub fn open_comment_panel<P: Page + ?Sized>(page: &P, config: &HarvestConfig) {
    if page.exists(scripts::COMMENT_LIST) {
        return;
    }

    if let Some(icon) = scripts::COMMENT_ICONS.iter().find(|selector| page.exists(selector)) {
        if let Err(e) = page.click(icon) {
            log::debug!("Comment icon {} not clickable: {}", icon, e);
        }
    }

    if let Err(e) = page.wait_for(scripts::COMMENT_REGION, config.panel_timeout) {
        log::debug!("Comment panel did not appear: {}", e);
    }
}
