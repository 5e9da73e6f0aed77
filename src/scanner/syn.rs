//! SYN (half-open) port scanner.
//!
//! A scan runs two blocking tasks side by side:
//!
//! - the **sender** walks the port selection, emitting one SYN per port
//!   from a pseudo-random source port, then waits out the settle period
//!   and raises the completion flag
//! - the **listener** reads every inbound IPv4 frame and records the source
//!   port of each SYN-ACK from the target, until it has seen the flag
//!
//! The completion flag is written only by the sender. The listener owns the
//! open ports and hands them back when it returns. If the listener stops
//! early, either on a receive error or because its hard ceiling elapsed, it
//! raises a separate abort flag so the sender stops too, and the scan fails
//! as incomplete.
//!
//! # Privileges Required
//!
//! Sending crafted frames needs a raw link-layer socket, which requires
//! root/sudo on most systems.

use indicatif::ProgressBar;
use pnet::packet::ethernet::EtherTypes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::config::ScanSettings;
use crate::error::{ScanError, ScanResult};
use crate::net::{transmit, FrameReceiver, FrameSender, Link};
use crate::packet::{build_tcp_syn, match_syn_ack};
use crate::types::ScanTarget;

/// Sender-side parameters for one scan.
#[derive(Debug, Clone)]
struct SendPlan {
    delay: Duration,
    settle: Duration,
    seed: u64,
    source_port_min: u16,
}

/// SYN scanner over a [`Link`].
///
/// **Requires elevated privileges (root/sudo) on a real interface.**
pub struct SynScanner {
    link: Arc<dyn Link>,
    settings: ScanSettings,
    progress: Option<ProgressBar>,
}

impl SynScanner {
    pub fn new(link: Arc<dyn Link>, settings: &ScanSettings) -> Self {
        Self {
            link,
            settings: settings.clone(),
            progress: None,
        }
    }

    /// Tick `progress` once per SYN sent.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Upper bound on how long the listener may run.
    fn listener_ceiling(&self, plan: &SendPlan, probes: usize) -> Duration {
        let probes = u32::try_from(probes).unwrap_or(u32::MAX);
        plan.delay
            .saturating_mul(probes)
            .saturating_add(plan.settle)
            .saturating_add(self.settings.listener_grace())
    }

    /// Scan every port in `target.ports`.
    ///
    /// Returns open ports in the order their SYN-ACKs arrived. A send
    /// failure stops the scan and is reported as [`ScanError::ScanAborted`];
    /// a listener failure fails the scan outright.
    pub async fn scan(&self, target: Arc<ScanTarget>) -> ScanResult<Vec<u16>> {
        let total = target.probe_count();
        let plan = SendPlan {
            delay: self.settings.send_delay(target.is_range_scan()),
            settle: self.settings.settle(),
            seed: self.settings.source_port_seed,
            source_port_min: self.settings.source_port_min,
        };
        let ceiling = self.listener_ceiling(&plan, total);

        info!(
            target = %target.target_ip,
            probes = total,
            delay = ?plan.delay,
            "starting syn scan"
        );

        // The receiver is open before the first SYN leaves.
        let receiver = self.link.open_receiver(EtherTypes::Ipv4)?;
        let sender = self.link.open_sender()?;
        let signals = Arc::new(Signals::default());

        let listener = tokio::task::spawn_blocking({
            let target = Arc::clone(&target);
            let signals = Arc::clone(&signals);
            move || listen_for_syn_acks(receiver, &target, &signals, ceiling)
        });

        let send = tokio::task::spawn_blocking({
            let target = Arc::clone(&target);
            let signals = Arc::clone(&signals);
            let progress = self.progress.clone();
            move || send_syns(sender, &target, &plan, &signals, progress.as_ref())
        });

        let (sent, heard) = tokio::join!(send, listener);
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        match (sent?, heard?) {
            (Ok(sent), Ok(open)) => {
                info!(sent, open = open.len(), "syn scan complete");
                Ok(open)
            }
            // The sender stopped because the listener did; report the cause.
            (Err(ScanError::ScanAborted { sent, total, .. }), Err(cause)) => {
                Err(ScanError::ScanAborted {
                    sent,
                    total,
                    reason: cause.to_string(),
                })
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }
}

/// Flags shared by the sender and listener of one scan.
#[derive(Debug, Default)]
struct Signals {
    /// Raised by the sender once every SYN is out and the settle period is over.
    done: AtomicBool,
    /// Raised by the listener when it stops before seeing `done`.
    abort: AtomicBool,
}

impl Signals {
    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }
}

/// Granularity of the sender's abort checks while it sleeps.
const ABORT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Sleep for `duration` unless `signals` is aborted first. Returns false if
/// the wait was cut short.
fn sleep_unless_aborted(duration: Duration, signals: &Signals) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if signals.aborted() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(ABORT_CHECK_INTERVAL));
    }
}

/// Emit one SYN per selected port, then settle and raise `done`.
///
/// On a send failure `done` is raised at once and the scan is reported as
/// aborted with the number of SYNs already sent. If the listener raises
/// `abort`, sending stops the same way.
fn send_syns(
    mut sender: Box<dyn FrameSender>,
    target: &ScanTarget,
    plan: &SendPlan,
    signals: &Signals,
    progress: Option<&ProgressBar>,
) -> ScanResult<usize> {
    let total = target.probe_count();
    let mut rng = StdRng::seed_from_u64(plan.seed);
    let mut sent = 0;
    let listener_stopped = |sent| ScanError::ScanAborted {
        sent,
        total,
        reason: "listener stopped".to_string(),
    };

    for port in target.ports.iter() {
        if signals.aborted() {
            debug!(sent, total, "listener stopped, halting sender");
            return Err(listener_stopped(sent));
        }

        let source_port = rng.gen_range(plan.source_port_min..=u16::MAX);
        let outcome = build_tcp_syn(
            target.source_ip,
            target.target_ip,
            target.source_mac,
            target.target_mac,
            source_port,
            port.as_u16(),
        )
        .and_then(|frame| transmit(sender.as_mut(), &frame));

        if let Err(e) = outcome {
            signals.done.store(true, Ordering::Release);
            warn!(%port, sent, total, error = %e, "syn send failed, aborting scan");
            return Err(ScanError::ScanAborted {
                sent,
                total,
                reason: e.to_string(),
            });
        }

        sent += 1;
        trace!(%port, source_port, "syn sent");
        if let Some(progress) = progress {
            progress.inc(1);
        }
        if !plan.delay.is_zero() {
            std::thread::sleep(plan.delay);
        }
    }

    debug!(sent, settle = ?plan.settle, "all syns sent, settling");
    if !sleep_unless_aborted(plan.settle, signals) {
        return Err(listener_stopped(sent));
    }
    signals.done.store(true, Ordering::Release);
    Ok(sent)
}

/// Collect SYN-ACK source ports until `done` has been seen.
///
/// The flag is read before each receive attempt, so one more attempt
/// always follows the read that observes it. A receive error or reaching
/// `ceiling` first raises `abort` and fails the listener, since the open
/// ports gathered so far may be incomplete.
fn listen_for_syn_acks(
    mut receiver: Box<dyn FrameReceiver>,
    target: &ScanTarget,
    signals: &Signals,
    ceiling: Duration,
) -> ScanResult<Vec<u16>> {
    let started = Instant::now();
    let mut seen = HashSet::new();
    let mut open = Vec::new();

    loop {
        let finished = signals.done.load(Ordering::Acquire);

        let frame = match receiver.recv() {
            Ok(frame) => frame,
            Err(e) => {
                signals.abort.store(true, Ordering::Release);
                warn!(error = %e, "listener receive failed");
                return Err(e);
            }
        };
        if let Some(port) = frame.and_then(|f| match_syn_ack(f, target.source_mac, target.target_ip)) {
            if seen.insert(port) {
                info!(port, "open port detected");
                open.push(port);
            } else {
                trace!(port, "duplicate syn-ack");
            }
        }

        if finished {
            break;
        }
        if started.elapsed() >= ceiling {
            signals.abort.store(true, Ordering::Release);
            warn!(?ceiling, open = open.len(), "listener hit its hard ceiling before the sender finished");
            return Err(ScanError::ListenerFailed(format!(
                "ceiling of {ceiling:?} elapsed before the sender finished"
            )));
        }
    }

    debug!(open = open.len(), elapsed = ?started.elapsed(), "listener stopped");
    Ok(open)
}
