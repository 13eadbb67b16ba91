use crate::{classify, systeminfo_url, HttpGet, Transport};
use std::collections::BTreeMap;
use std::sync::Arc;
use sweep_core::{Credential, QueryOutcome, ReportRow, ReportSink, Target};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Upper bound on queries in flight.
pub const MAX_CONCURRENCY: usize = 1024;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// URL scheme, `https` unless pointed at a lab device.
    pub scheme: String,
    /// Queries in flight at once; 1 keeps the run strictly sequential.
    pub concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions { scheme: "https".into(), concurrency: 1 }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
}

impl SweepSummary {
    fn record(&mut self, outcome: &QueryOutcome) {
        self.total += 1;
        *self.by_kind.entry(outcome.kind()).or_insert(0) += 1;
    }

    pub fn succeeded(&self) -> usize {
        self.by_kind.get("success").copied().unwrap_or(0)
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded()
    }
}

/// Query every target and write one row per target, in input order.
///
/// Per-target failures become rows; only a sink I/O error ends the sweep early.
pub async fn sweep<E: HttpGet, S: ReportSink>(
    targets: &[Target],
    credential: &Credential,
    executor: Arc<E>,
    sink: &mut S,
    opts: &SweepOptions,
) -> std::io::Result<SweepSummary> {
    let mut summary = SweepSummary::default();
    if opts.concurrency <= 1 {
        for target in targets {
            let outcome = query_one(&*executor, &opts.scheme, target, credential).await;
            emit(sink, &mut summary, target, &outcome)?;
        }
    } else {
        sweep_pooled(targets, credential, executor, sink, opts, &mut summary).await?;
    }
    sink.finish()?;
    Ok(summary)
}

/// Worker pool variant. Outcomes arrive in completion order and are reassembled by index.
async fn sweep_pooled<E: HttpGet, S: ReportSink>(
    targets: &[Target],
    credential: &Credential,
    executor: Arc<E>,
    sink: &mut S,
    opts: &SweepOptions,
    summary: &mut SweepSummary,
) -> std::io::Result<()> {
    let credential = Arc::new(credential.clone());
    let scheme: Arc<str> = Arc::from(opts.scheme.as_str());
    let sem = Arc::new(Semaphore::new(opts.concurrency.min(MAX_CONCURRENCY)));
    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, QueryOutcome)>();
    let jobs: Vec<(usize, Target)> = targets.iter().cloned().enumerate().collect();

    // workers live in the dispatcher's JoinSet, so aborting the dispatcher cancels them too
    let dispatcher = tokio::spawn(async move {
        let mut workers = JoinSet::new();
        for (idx, target) in jobs {
            let Ok(permit) = sem.clone().acquire_owned().await else { break };
            let tx = tx.clone();
            let executor = executor.clone();
            let credential = credential.clone();
            let scheme = scheme.clone();
            workers.spawn(async move {
                let outcome = query_one(&*executor, &scheme, &target, &credential).await;
                drop(permit);
                let _ = tx.send((idx, outcome));
            });
        }
        drop(tx);
        while workers.join_next().await.is_some() {}
    });

    let mut pending: BTreeMap<usize, QueryOutcome> = BTreeMap::new();
    let mut next = 0usize;
    while let Some((idx, outcome)) = rx.recv().await {
        pending.insert(idx, outcome);
        while let Some(outcome) = pending.remove(&next) {
            if let Err(e) = emit(sink, summary, &targets[next], &outcome) {
                dispatcher.abort();
                let _ = dispatcher.await;
                return Err(e);
            }
            next += 1;
        }
    }
    // a worker that died without reporting still owes its row
    for (idx, target) in targets.iter().enumerate().skip(next) {
        let outcome = pending
            .remove(&idx)
            .unwrap_or_else(|| QueryOutcome::ToolingFailure("query task did not complete".into()));
        emit(sink, summary, target, &outcome)?;
    }
    let _ = dispatcher.await;
    Ok(())
}

async fn query_one<E: HttpGet>(executor: &E, scheme: &str, target: &Target, credential: &Credential) -> QueryOutcome {
    let transport = match systeminfo_url(scheme, &target.0) {
        Ok(url) => {
            log::info!("querying {}", url);
            executor.get(url.as_str(), credential).await
        }
        Err(e) => Transport::Error { signal: "url".into(), detail: e.to_string() },
    };
    classify(&transport)
}

fn emit<S: ReportSink>(sink: &mut S, summary: &mut SweepSummary, target: &Target, outcome: &QueryOutcome) -> std::io::Result<()> {
    match outcome {
        QueryOutcome::Success(sn) => log::info!("{}: serial {}", target, sn),
        other => log::warn!("{}: {}", target, other),
    }
    summary.record(outcome);
    sink.write_row(&ReportRow::new(target.clone(), outcome))
}
