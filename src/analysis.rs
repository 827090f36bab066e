//! The event loop shared by both analyses
use log::{debug, info};

use crate::error::Result;
use crate::histogram::{Histogram, HistogramSet};

const PROGRESS_INTERVAL: usize = 10_000;

/// Typed per-event records
pub trait EventSource {
    type Event;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn event(&self, idx: usize) -> Result<Self::Event>;
}

/// The histograms of one analysis step
pub trait Accumulator<E> {
    fn fill(&mut self, event: &E);

    fn into_histograms(self: Box<Self>) -> Vec<Histogram>;
}

pub type Accumulators<E> = Vec<Box<dyn Accumulator<E>>>;

/// Fill all accumulators with every event of `source`
pub fn run<S: EventSource>(
    source: &S,
    mut accumulators: Accumulators<S::Event>,
) -> Result<HistogramSet> {
    let n = source.len();
    debug!("Running {} steps over {n} events", accumulators.len());
    for idx in 0..n {
        if idx % PROGRESS_INTERVAL == 0 {
            info!("Processing event {idx}/{n}");
        }
        let event = source.event(idx)?;
        for acc in accumulators.iter_mut() {
            acc.fill(&event);
        }
    }
    let mut res = HistogramSet::new();
    for acc in accumulators {
        res.extend(acc.into_histograms())?;
    }
    Ok(res)
}

/// Pileup regimes used to split multiplicity distributions
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PileupRegime {
    Low,
    Mid,
    High,
}

impl PileupRegime {
    pub const ALL: [PileupRegime; 3] = [Self::Low, Self::Mid, Self::High];

    /// The regime of an event, if any
    pub fn classify(mu: f64) -> Option<Self> {
        if mu < 30. {
            Some(Self::Low)
        } else if mu > 35. && mu < 45. {
            Some(Self::Mid)
        } else if mu > 50. {
            Some(Self::High)
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Low => "lowmu",
            Self::Mid => "midmu",
            Self::High => "highmu",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Low => "#mu_{average} < 30",
            Self::Mid => "35 < #mu_{average} < 45",
            Self::High => "#mu_{average} > 50",
        }
    }
}
