use std::sync::Arc;

use formats::OccupationEntry;
use foundation::bounds::{BoundingBox, LngLat, centroid_approx};
use foundation::ids::RegionId;
use layers::{ClassifiedCollection, PopupContent, classify_all, format_salary_per_year};
use scene::{
    ActivePopup, CountyOption, InvalidSalaryInput, LocationIndex, Selection, WageThresholdTable,
    parse_salary,
};
use streaming::{FetchError, FetchTicket, RequestToken, TokenGate};

use crate::config::SessionConfig;
use crate::output::{PanelSummary, SessionOutput, ZoomRequest};

/// Discrete user and map events.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Empty text clears the state selection.
    SetState(String),
    /// Empty text clears the region selection.
    SetCounty(String),
    SetOccupation(String),
    SetSalary(String),
    ToggleCollapse,
    ToggleLottery,
    RegionClicked { id: String, point: LngLat },
}

/// How a fetch resolution was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Latest response; the table is now held and the view reclassified
    /// (unless the salary is cleared).
    Applied,
    /// A newer request was issued since; the response was dropped.
    Stale,
    /// Latest request failed; prior classification is untouched.
    Failed(FetchError),
}

#[derive(Debug, Clone)]
struct LoadedTable {
    occupation_key: String,
    table: Arc<WageThresholdTable>,
}

/// One user's map session.
///
/// All state lives here and every transition is synchronous; wage-table
/// fetches are handed out as `FetchTicket`s and reported back through
/// `resolve_fetch`. Rendering requests accumulate until `drain_outputs`.
pub struct Session {
    config: SessionConfig,
    index: Arc<LocationIndex>,
    selection: Selection,
    occupation_title: Option<String>,
    gate: TokenGate,
    in_flight: Option<FetchTicket>,
    loaded: Option<LoadedTable>,
    view: Arc<ClassifiedCollection>,
    popup: Option<PopupContent>,
    county_options: Vec<CountyOption>,
    outputs: Vec<SessionOutput>,
}

impl Session {
    pub fn new(config: SessionConfig, index: Arc<LocationIndex>) -> Self {
        let selection = Selection::new(config.default_occupation.clone(), config.default_salary);
        let occupation_title = config.default_occupation_title.clone();
        let view = Arc::new(ClassifiedCollection::unclassified(Arc::clone(
            index.collection(),
        )));
        Self {
            config,
            index,
            selection,
            occupation_title,
            gate: TokenGate::new(),
            in_flight: None,
            loaded: None,
            view,
            popup: None,
            county_options: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Publishes the initial (unclassified) view and requests the default table.
    pub fn start(&mut self) -> FetchTicket {
        self.outputs.push(SessionOutput::Fill(Arc::clone(&self.view)));
        self.issue_fetch()
    }

    pub fn apply(&mut self, event: SessionEvent) -> Option<FetchTicket> {
        match event {
            SessionEvent::SetState(abbr) => {
                self.set_state(&abbr);
                None
            }
            SessionEvent::SetCounty(id) => {
                self.set_county(&id);
                None
            }
            SessionEvent::SetOccupation(code) => Some(self.set_occupation(&code)),
            SessionEvent::SetSalary(raw) => self.set_salary(&raw).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "salary input rejected");
                None
            }),
            SessionEvent::ToggleCollapse => {
                self.toggle_collapse();
                None
            }
            SessionEvent::ToggleLottery => {
                self.toggle_lottery();
                None
            }
            SessionEvent::RegionClicked { id, point } => {
                self.region_clicked(&id, point);
                None
            }
        }
    }

    pub fn set_state(&mut self, abbr: &str) {
        let abbr = abbr.trim().to_ascii_uppercase();
        self.selection.selected_county_id = None;
        self.close_popup();

        if abbr.is_empty() {
            self.selection.selected_state = None;
            self.county_options.clear();
            self.outputs.push(SessionOutput::CountyOptions(Vec::new()));
            self.zoom_to(self.config.country_bounds, None);
            return;
        }

        self.county_options = self.index.counties(&abbr).to_vec();
        self.outputs
            .push(SessionOutput::CountyOptions(self.county_options.clone()));
        match self.index.state_bounds(&abbr) {
            Some(bounds) => self.zoom_to(bounds, None),
            None => tracing::warn!(state = %abbr, "no regions for state; not zooming"),
        }
        self.selection.selected_state = Some(abbr);
    }

    pub fn set_county(&mut self, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            self.selection.selected_county_id = None;
            self.close_popup();
            return;
        }
        self.selection.selected_county_id = Some(RegionId::from(id));

        let Some(region) = self.index.region(id) else {
            tracing::warn!(region = id, "unknown region selected");
            return;
        };
        let bounds = region.bounds();
        if let Some(bounds) = bounds {
            self.zoom_to(bounds, Some(self.config.county_max_zoom));
        }
        match centroid_approx(bounds) {
            Some(anchor) => {
                self.open_popup(id, anchor);
            }
            None => tracing::debug!(region = id, "region has no geometry; no popup"),
        }
    }

    /// Selects a table key directly. Display text falls back to the key.
    pub fn set_occupation(&mut self, code: &str) -> FetchTicket {
        self.selection.occupation_code = code.trim().to_string();
        self.occupation_title = None;
        self.issue_fetch()
    }

    /// Selects a directory entry; its parent table is what gets fetched.
    pub fn select_occupation(&mut self, entry: &OccupationEntry) -> FetchTicket {
        self.selection.occupation_code = entry.parent.clone();
        self.occupation_title = Some(entry.display());
        self.issue_fetch()
    }

    /// Applies salary text.
    ///
    /// Invalid text is rejected with the prior salary kept. A cleared salary
    /// is recorded but leaves the current view alone. Otherwise the held table
    /// is reclassified right away; a fetch is only issued when no table for
    /// the current occupation is held or on its way.
    pub fn set_salary(&mut self, raw: &str) -> Result<Option<FetchTicket>, InvalidSalaryInput> {
        let salary = parse_salary(raw)?;
        self.selection.salary = salary;
        if salary.is_none() {
            return Ok(None);
        }

        if let Some(table) = self.current_table() {
            self.reclassify(&table);
            return Ok(None);
        }
        if self.fetch_pending_for_current() {
            return Ok(None);
        }
        Ok(Some(self.issue_fetch()))
    }

    pub fn clear_salary(&mut self) {
        self.selection.salary = None;
    }

    pub fn toggle_collapse(&mut self) {
        self.selection.panel_collapsed = !self.selection.panel_collapsed;
    }

    pub fn toggle_lottery(&mut self) {
        self.selection.lottery_enabled = !self.selection.lottery_enabled;
        self.refresh_popup();
    }

    /// Opens the popup at the interaction point rather than the centroid.
    pub fn region_clicked(&mut self, id: &str, point: LngLat) {
        self.open_popup(id, point);
    }

    /// Reports a finished fetch. Only the latest-issued token is applied.
    pub fn resolve_fetch(
        &mut self,
        token: RequestToken,
        result: Result<WageThresholdTable, FetchError>,
    ) -> FetchOutcome {
        if !self.gate.accept(token) {
            tracing::debug!(token = token.0, "dropping stale wage table response");
            return FetchOutcome::Stale;
        }
        let Some(ticket) = self.in_flight.take() else {
            return FetchOutcome::Stale;
        };

        match result {
            Ok(table) => {
                let table = Arc::new(table);
                self.loaded = Some(LoadedTable {
                    occupation_key: ticket.occupation_key.clone(),
                    table: Arc::clone(&table),
                });
                let classified = self.reclassify(&table);
                tracing::debug!(
                    token = token.0,
                    occupation = %ticket.occupation_key,
                    entries = table.len(),
                    classified,
                    "wage table applied"
                );
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(
                    occupation = %ticket.occupation_key,
                    error = %e,
                    "wage table fetch failed; keeping previous levels"
                );
                FetchOutcome::Failed(e)
            }
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn index(&self) -> &Arc<LocationIndex> {
        &self.index
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The classified view currently shown.
    pub fn view(&self) -> &Arc<ClassifiedCollection> {
        &self.view
    }

    pub fn popup(&self) -> Option<&PopupContent> {
        self.popup.as_ref()
    }

    pub fn county_options(&self) -> &[CountyOption] {
        &self.county_options
    }

    pub fn pending_fetch(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    pub fn summary(&self) -> PanelSummary {
        let occupation = match &self.occupation_title {
            Some(title) => title.clone(),
            None if !self.selection.occupation_code.is_empty() => {
                self.selection.occupation_code.clone()
            }
            None => "—".to_string(),
        };
        PanelSummary {
            occupation,
            salary: format_salary_per_year(self.selection.salary),
        }
    }

    pub fn drain_outputs(&mut self) -> Vec<SessionOutput> {
        std::mem::take(&mut self.outputs)
    }

    fn issue_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket {
            token: self.gate.issue(),
            occupation_key: self.selection.occupation_code.clone(),
        };
        tracing::debug!(
            token = ticket.token.0,
            occupation = %ticket.occupation_key,
            "requesting wage table"
        );
        self.in_flight = Some(ticket.clone());
        ticket
    }

    fn current_table(&self) -> Option<Arc<WageThresholdTable>> {
        self.loaded
            .as_ref()
            .filter(|l| l.occupation_key == self.selection.occupation_code)
            .map(|l| Arc::clone(&l.table))
    }

    fn fetch_pending_for_current(&self) -> bool {
        self.gate.is_pending()
            && self
                .in_flight
                .as_ref()
                .is_some_and(|t| t.occupation_key == self.selection.occupation_code)
    }

    /// Returns false when the pass was aborted (salary cleared).
    fn reclassify(&mut self, table: &Arc<WageThresholdTable>) -> bool {
        let Some(salary) = self.selection.salary else {
            return false;
        };
        let Some(view) = classify_all(table, self.index.collection(), salary) else {
            return false;
        };
        self.view = Arc::new(view);
        self.outputs.push(SessionOutput::Fill(Arc::clone(&self.view)));
        self.refresh_popup();
        true
    }

    fn zoom_to(&mut self, bounds: BoundingBox, max_zoom: Option<f64>) {
        self.outputs.push(SessionOutput::Zoom(ZoomRequest {
            bounds,
            max_zoom,
            duration_ms: self.config.fit_duration_ms,
            padding: self.config.fit_padding,
        }));
    }

    fn content_for(&self, id: &str) -> Option<PopupContent> {
        if !self.index.contains(id) {
            return None;
        }
        self.view
            .popup_content(id, self.selection.lottery_enabled, &self.config.style)
    }

    fn open_popup(&mut self, id: &str, anchor: LngLat) -> bool {
        let Some(content) = self.content_for(id) else {
            tracing::warn!(region = id, "no popup for region outside the index");
            return false;
        };
        let popup = ActivePopup {
            region_id: RegionId::from(id),
            anchor,
        };
        self.selection.active_popup = Some(popup.clone());
        self.popup = Some(content.clone());
        self.outputs.push(SessionOutput::PopupOpened { popup, content });
        true
    }

    /// Re-resolves the open popup against the current view, keeping its anchor.
    fn refresh_popup(&mut self) {
        let Some(active) = self.selection.active_popup.clone() else {
            return;
        };
        match self.content_for(active.region_id.as_str()) {
            Some(content) => {
                self.popup = Some(content.clone());
                self.outputs.push(SessionOutput::PopupUpdated {
                    popup: active,
                    content,
                });
            }
            None => self.close_popup(),
        }
    }

    fn close_popup(&mut self) {
        self.popup = None;
        if self.selection.active_popup.take().is_some() {
            self.outputs.push(SessionOutput::PopupClosed);
        }
    }
}
