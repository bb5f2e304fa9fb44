//! Quiz-driven cover preview.
//!
//! Chart and cover-design assets arrive through an opaque [`AssetSource`].
//! Every fetch is a single attempt. Each asset slot numbers its requests, and
//! a completion is committed only while its ticket is still the newest one,
//! so a slow response can never overwrite a newer one.

use crate::cover::{Compositor, Cover, CoverInputs};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    pub name: String,
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    /// Free-form local time, e.g. `"14:30"`.
    #[serde(default)]
    pub birth_time: Option<String>,
    pub birth_place: String,
}

impl QuizAnswers {
    /// `March 14, 1990`, or ISO-style digits when the month is out of range.
    pub fn birth_date_label(&self) -> String {
        match MONTHS.get((self.birth_month as usize).wrapping_sub(1)) {
            Some(month) => format!("{month} {}, {}", self.birth_day, self.birth_year),
            None => format!(
                "{:04}-{:02}-{:02}",
                self.birth_year, self.birth_month, self.birth_day
            ),
        }
    }

    pub fn chart_request(&self) -> ChartRequest {
        ChartRequest {
            name: self.name.trim().to_string(),
            birth_year: self.birth_year,
            birth_month: self.birth_month,
            birth_day: self.birth_day,
            birth_time: self.birth_time.clone(),
            birth_place: self.birth_place.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub color_scheme: String,
    /// Asset key handed to [`AssetSource::fetch_cover_design`].
    #[serde(default)]
    pub cover_design: Option<String>,
}

/// Everything a chart provider needs to draw a natal chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub name: String,
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    pub birth_time: Option<String>,
    pub birth_place: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no asset configured")]
    NotConfigured,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset unavailable: {0}")]
    Unavailable(String),
}

pub type FetchResult = std::result::Result<String, FetchError>;

pub trait AssetSource {
    fn fetch_chart(&self, request: &ChartRequest) -> impl Future<Output = FetchResult>;
    fn fetch_cover_design(&self, key: &str) -> impl Future<Output = FetchResult>;
}

/// Serves assets from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileAssetSource {
    pub chart_path: Option<PathBuf>,
    /// Cover-design keys resolve relative to this directory when set.
    pub design_dir: Option<PathBuf>,
}

impl FileAssetSource {
    fn read(path: PathBuf) -> FetchResult {
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

impl AssetSource for FileAssetSource {
    fn fetch_chart(&self, _request: &ChartRequest) -> impl Future<Output = FetchResult> {
        let path = self.chart_path.clone();
        async move {
            match path {
                Some(path) => Self::read(path),
                None => Err(FetchError::NotConfigured),
            }
        }
    }

    fn fetch_cover_design(&self, key: &str) -> impl Future<Output = FetchResult> {
        let path = match &self.design_dir {
            Some(dir) => dir.join(key),
            None => PathBuf::from(key),
        };
        async move { Self::read(path) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    slot: Slot,
    seq: u64,
}

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Chart,
    CoverDesign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Default)]
struct Sequencer {
    chart: u64,
    design: u64,
}

impl Sequencer {
    fn next(&mut self, slot: Slot) -> RequestTicket {
        let counter = match slot {
            Slot::Chart => &mut self.chart,
            Slot::CoverDesign => &mut self.design,
        };
        *counter += 1;
        RequestTicket { slot, seq: *counter }
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        let latest = match ticket.slot {
            Slot::Chart => self.chart,
            Slot::CoverDesign => self.design,
        };
        ticket.seq == latest
    }
}

pub struct PreviewSession {
    compositor: Compositor,
    answers: QuizAnswers,
    customization: Customization,
    cover: Cover,
    sequencer: Sequencer,
}

impl PreviewSession {
    pub fn new(compositor: Compositor, answers: QuizAnswers, customization: Customization) -> Result<Self> {
        compositor.scheme(&customization.color_scheme)?;
        let cover = Cover::new(cover_inputs(&answers, &customization));
        Ok(Self {
            compositor,
            answers,
            customization,
            cover,
            sequencer: Sequencer::default(),
        })
    }

    pub fn cover(&self) -> &Cover {
        &self.cover
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn answers(&self) -> &QuizAnswers {
        &self.answers
    }

    pub fn customization(&self) -> &Customization {
        &self.customization
    }

    /// Updates the text details. The chart stays as it is until a new chart request commits.
    /// Returns whether the chart needs refetching; if so, in-flight chart requests are stale.
    pub fn update_answers(&mut self, answers: QuizAnswers) -> bool {
        let chart_changed = answers.chart_request() != self.answers.chart_request();
        if chart_changed {
            self.sequencer.next(Slot::Chart);
        }
        self.cover
            .set_details(&answers.name, &answers.birth_date_label(), &answers.birth_place);
        self.answers = answers;
        chart_changed
    }

    /// Applies a new scheme and design choice. Returns whether the design asset needs refetching.
    pub fn customize(&mut self, customization: Customization) -> Result<bool> {
        self.cover.set_scheme(&self.compositor, &customization.color_scheme)?;
        let design_changed = customization.cover_design != self.customization.cover_design;
        if design_changed {
            // Supersede any in-flight design fetch.
            self.sequencer.next(Slot::CoverDesign);
            if customization.cover_design.is_none() {
                self.cover.set_cover_design(None);
            }
        }
        self.customization = customization;
        Ok(design_changed && self.customization.cover_design.is_some())
    }

    pub fn begin_chart_request(&mut self) -> (RequestTicket, ChartRequest) {
        (self.sequencer.next(Slot::Chart), self.answers.chart_request())
    }

    pub fn begin_design_request(&mut self) -> Option<(RequestTicket, String)> {
        let key = self.customization.cover_design.clone()?;
        Some((self.sequencer.next(Slot::CoverDesign), key))
    }

    /// Commits a chart fetch. Failures resolve to the fallback chart.
    pub fn commit_chart(&mut self, ticket: RequestTicket, result: FetchResult) -> Result<Commit> {
        if ticket.slot != Slot::Chart || !self.sequencer.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, "discarding stale chart response");
            return Ok(Commit::Stale);
        }
        let chart = match result {
            Ok(svg) => Some(svg),
            Err(err) => {
                tracing::warn!(error = %err, "chart fetch failed, using fallback chart");
                None
            }
        };
        self.cover.resolve_chart(&self.compositor, chart)?;
        Ok(Commit::Applied)
    }

    /// Commits a cover-design fetch. A failed fetch simply leaves the layer out.
    pub fn commit_design(&mut self, ticket: RequestTicket, result: FetchResult) -> Commit {
        if ticket.slot != Slot::CoverDesign || !self.sequencer.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, "discarding stale cover design response");
            return Commit::Stale;
        }
        match result {
            Ok(svg) => self.cover.set_cover_design(Some(svg)),
            Err(err) => {
                tracing::warn!(error = %err, "cover design fetch failed, omitting design layer");
                self.cover.set_cover_design(None);
            }
        }
        Commit::Applied
    }

    /// Fetches the chart and any selected design concurrently, then commits both.
    pub async fn refresh<S: AssetSource>(&mut self, source: &S) -> Result<()> {
        let (chart_ticket, request) = self.begin_chart_request();
        let design = self.begin_design_request();

        let chart_fut = source.fetch_chart(&request);
        let design_fut = async {
            match &design {
                Some((_, key)) => Some(source.fetch_cover_design(key).await),
                None => None,
            }
        };
        let (chart_result, design_result) = futures::join!(chart_fut, design_fut);

        if let (Some((ticket, _)), Some(result)) = (design, design_result) {
            self.commit_design(ticket, result);
        }
        self.commit_chart(chart_ticket, chart_result)?;
        Ok(())
    }

    pub fn render(&self) -> Result<String> {
        self.cover.render(&self.compositor)
    }
}

fn cover_inputs(answers: &QuizAnswers, customization: &Customization) -> CoverInputs {
    CoverInputs {
        name: answers.name.clone(),
        birth_date: answers.birth_date_label(),
        birth_place: answers.birth_place.clone(),
        color_scheme_key: customization.color_scheme.clone(),
        chart_svg: None,
        cover_design_svg: None,
    }
}
