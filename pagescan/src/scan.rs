use crate::{
    config,
    device::{DeviceSubsystem, OptionSetting, Read, ScanDevice},
    error::ScanError,
};
use image::DynamicImage;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
use tokio::sync::{mpsc, oneshot};

pub type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
pub enum ScanState {
    Prepare,
    Progress(f64),
    Done(DynamicImage),
    Error(ScanError),
    Cancelled,
}

/// Capture running on the `scan` thread.
pub struct ScanJob {
    pub device: String,
    cancel: Option<oneshot::Sender<()>>,
    state: mpsc::Receiver<ScanState>,
    handle: Option<JoinHandle<()>>,
}

pub fn start<S>(
    subsystem: Arc<S>,
    device: String,
    settings: config::Scan,
    waker: Waker,
) -> Result<ScanJob, ScanError>
where
    S: DeviceSubsystem,
{
    let (cancel_tx, mut cancel_rx) = oneshot::channel();
    let (state_tx, state_rx) = mpsc::channel(4);

    let device_name = device.clone();
    let handle = thread::Builder::new()
        .name("scan".to_owned())
        .spawn(move || {
            let notify = |state: ScanState| {
                let sent = state_tx.blocking_send(state).is_ok();
                waker();
                sent
            };

            match capture(&*subsystem, &device_name, &settings, &notify, &mut cancel_rx) {
                Ok(Some(image)) => _ = notify(ScanState::Done(image)),
                Ok(None) => _ = notify(ScanState::Cancelled),
                Err(err) => _ = notify(ScanState::Error(err)),
            }
        })
        .map_err(ScanError::Worker)?;

    Ok(ScanJob {
        device,
        cancel: Some(cancel_tx),
        state: state_rx,
        handle: Some(handle),
    })
}

impl ScanJob {
    /// Next state update, `None` when nothing new arrived.
    /// A worker that went away without a final state is reported as an error.
    pub fn try_next(&mut self) -> Option<ScanState> {
        match self.state.try_recv() {
            Ok(state) => Some(state),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Some(ScanState::Error(ScanError::WorkerLost))
            }
        }
    }

    /// Asks the worker to stop and waits for it. The worker notices the request
    /// between two reads, so a hung device keeps it waiting.
    pub fn cancel(mut self) {
        self.stop();
        self.wait();
    }

    /// Waits for a worker that already sent its final state.
    pub fn join(mut self) {
        self.wait();
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            _ = cancel.send(());
        }

        // Unblock a worker waiting for space in the state channel.
        self.state.close();
        while self.state.try_recv().is_ok() {}
    }

    fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Scan thread panicked");
            }
        }
    }
}

impl Drop for ScanJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            log::debug!("Scan job on '{}' dropped while running, cancel it", self.device);
            self.stop();
            self.wait();
        }
    }
}

/// Drives one capture: configure the device, read until end-of-data and take
/// the last produced page. Returns `None` when cancelled.
pub fn capture<S>(
    subsystem: &S,
    device: &str,
    settings: &config::Scan,
    notify: &dyn Fn(ScanState) -> bool,
    cancel: &mut oneshot::Receiver<()>,
) -> Result<Option<DynamicImage>, ScanError>
where
    S: DeviceSubsystem + ?Sized,
{
    macro_rules! send_state {
        ($state:expr) => {
            if !notify($state) {
                log::debug!("State receiver was dropped");
                return Ok(None);
            }
        };
    }
    macro_rules! check_cancellation {
        ($channel:expr) => {
            match $channel.try_recv() {
                Ok(()) => {
                    log::debug!("Scan cancelled");
                    return Ok(None);
                }
                Err(oneshot::error::TryRecvError::Closed) => {
                    log::debug!("Cancel sender was dropped");
                    return Ok(None);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        };
    }

    send_state!(ScanState::Prepare);

    log::debug!("Use scanner '{device}'");

    check_cancellation!(cancel);
    let mut scanner = subsystem.open(device)?;

    setup_scanner(&mut *scanner, settings);

    check_cancellation!(cancel);
    let mut session = scanner.start()?;

    send_state!(ScanState::Progress(0.0));

    let expected = session.expected_bytes();
    let mut received = 0;
    let mut previous_progress = 0.0;
    loop {
        check_cancellation!(cancel);

        let count = match session.read()? {
            Read::Data(count) => count,
            Read::EndOfData => break,
        };

        received += count;

        let Some(expected) = expected.filter(|expected| *expected > 0) else {
            continue;
        };

        let progress = (received as f64 / expected as f64 * 100.).min(100.);

        log::trace!("Scan progress {received} of {expected} bytes ({progress:.1}%)");

        if progress - previous_progress >= 5.0 {
            send_state!(ScanState::Progress(progress));
            previous_progress = progress;
        }
    }

    send_state!(ScanState::Progress(100.0));

    check_cancellation!(cancel);

    let mut images = session.into_images();
    log::debug!("Scan done, {} page(s) produced", images.len());

    images.pop().map(Some).ok_or(ScanError::NoImage)
}

/// Requests resolution and mode. Options the device refuses keep their
/// default value.
fn setup_scanner(scanner: &mut dyn ScanDevice, settings: &config::Scan) {
    let options = [
        ("resolution", OptionSetting::Number(settings.resolution)),
        ("mode", OptionSetting::Text(settings.mode.clone())),
    ];

    for (name, value) in options {
        match scanner.set_option(name, &value) {
            Ok(()) => {
                log::debug!("Successfully set value {value} for option '{name}'");
            }
            Err(err) => {
                log::warn!(
                    "Failed to set {value} for option '{name}' of '{device}', \
                     use device default: {err}",
                    device = scanner.name(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, wait_until, FakeDevice, FakeSubsystem};
    use std::sync::atomic::Ordering;

    fn endless_subsystem() -> Arc<FakeSubsystem> {
        Arc::new(FakeSubsystem::new(vec![
            FakeDevice::new("hp:1", vec![]).endless()
        ]))
    }

    #[test]
    fn dropped_job_stops_worker() {
        let subsystem = endless_subsystem();
        let opened = subsystem.opened_handle();

        let job = start(
            Arc::clone(&subsystem),
            "hp:1".to_owned(),
            config::Scan::default(),
            Arc::new(|| {}),
        )
        .unwrap();
        wait_until(|| !opened.lock().unwrap().is_empty());

        drop(job);

        // The worker released its handle to the subsystem.
        assert_eq!(Arc::strong_count(&subsystem), 1);
    }

    #[test]
    fn cancelled_job_releases_subsystem() {
        let subsystem = endless_subsystem();
        let teardowns = subsystem.teardowns_handle();

        let job = start(
            Arc::clone(&subsystem),
            "hp:1".to_owned(),
            config::Scan::default(),
            Arc::new(|| {}),
        )
        .unwrap();
        job.cancel();

        drop(subsystem);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finished_job_reports_done() {
        let subsystem = Arc::new(FakeSubsystem::new(vec![FakeDevice::new(
            "hp:1",
            vec![vec![page(3)]],
        )]));

        let mut job = start(
            subsystem,
            "hp:1".to_owned(),
            config::Scan::default(),
            Arc::new(|| {}),
        )
        .unwrap();

        let mut states = Vec::new();
        let mut done = None;
        wait_until(|| {
            while let Some(state) = job.try_next() {
                match state {
                    ScanState::Done(image) => {
                        done = Some(image);
                        break;
                    }
                    state => states.push(state),
                }
            }
            done.is_some()
        });
        job.join();

        assert!(matches!(states.first(), Some(ScanState::Prepare)));
        assert!(states
            .iter()
            .all(|state| matches!(state, ScanState::Prepare | ScanState::Progress(_))));
        assert_eq!(done, Some(page(3)));
    }
}
