use crate::{
    datatypes::{Attitude, Fragment, MotionVector},
    estimator::{DriftEstimator, SessionPhase},
    utils::{buffer::Buffer, capacity::Capacity},
};

/// One logical tick of telemetry. Coherent once `attitude` is populated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleRecord {
    pub attitude: Option<Attitude>,
    pub accel: Option<MotionVector>,
    pub gyro: Option<MotionVector>,
}

impl SampleRecord {
    pub fn is_coherent(&self) -> bool {
        self.attitude.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum MotionSlot {
    Accel,
    Gyro,
}

impl MotionSlot {
    fn set(self, record: &mut SampleRecord, v: MotionVector) {
        match self {
            MotionSlot::Accel => record.accel = Some(v),
            MotionSlot::Gyro => record.gyro = Some(v),
        }
    }
}

/// Arrival-ordered log of the records of one flight session.
///
/// A new record is opened by every attitude fragment, unless the last record
/// is still pending (it received accel/gyro readings but no attitude yet), in
/// which case the attitude completes it. Accel and gyro readings always go to
/// the last record, replacing any earlier reading of the same kind; they only
/// open a record when the store is empty.
///
/// The first attitude ever ingested becomes the session baseline and is never
/// replaced, even when retention evicts the record it came from.
#[derive(Debug, Clone)]
pub struct SampleStore {
    records: Buffer<SampleRecord>,
    baseline: Option<Attitude>,
    latest_attitude: Option<Attitude>,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new(Capacity::Unbounded)
    }
}

impl SampleStore {
    pub fn new(retention: Capacity) -> Self {
        SampleStore {
            records: Buffer::new(retention),
            baseline: None,
            latest_attitude: None,
        }
    }

    pub fn ingest(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Attitude(a) => self.ingest_attitude(a),
            Fragment::Accel(v) => self.ingest_accel(v),
            Fragment::Gyro(v) => self.ingest_gyro(v),
        }
    }

    pub fn ingest_attitude(&mut self, a: Attitude) {
        match self.records.back_mut() {
            Some(last) if last.attitude.is_none() => last.attitude = Some(a),
            _ => self.records.push(SampleRecord {
                attitude: Some(a),
                ..Default::default()
            }),
        }

        self.latest_attitude = Some(a);

        if self.baseline.is_none() {
            self.baseline = Some(a);
        }
    }

    pub fn ingest_accel(&mut self, v: MotionVector) {
        self.ingest_motion(MotionSlot::Accel, v);
    }

    pub fn ingest_gyro(&mut self, v: MotionVector) {
        self.ingest_motion(MotionSlot::Gyro, v);
    }

    fn ingest_motion(&mut self, slot: MotionSlot, v: MotionVector) {
        // Only an attitude closes a record; the latest reading wins
        match self.records.back_mut() {
            Some(last) => slot.set(last, v),
            None => {
                let mut record = SampleRecord::default();
                slot.set(&mut record, v);
                self.records.push(record);
            }
        }
    }

    /// Newest `n` records in arrival order
    pub fn tail(&self, n: usize) -> Vec<SampleRecord> {
        self.records.tail(n)
    }

    pub fn baseline(&self) -> Option<Attitude> {
        self.baseline
    }

    pub fn latest(&self) -> Option<Attitude> {
        self.latest_attitude
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Session phase as seen by the default estimator
    pub fn phase(&self) -> SessionPhase {
        DriftEstimator::default().phase(self)
    }
}
