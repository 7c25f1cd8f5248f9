//! Input methods: the four ways a user seeds a divination.
//!
//! Nothing here touches the network. Each method produces a
//! [`DivinationInputResult`] that the workbench consumes once.

use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::hexagram::LineValue;

/// Pause between two staged coin throws.
pub const COIN_THROW_DELAY: Duration = Duration::from_millis(300);

/// Throws (and lines) per divination.
pub const THROW_COUNT: usize = 6;

/// Minimum digits the numbers method needs.
pub const MIN_DIGITS: usize = 2;

// ─── Methods and payloads ────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DivinationMethod {
  #[default]
  Coins,
  Numbers,
  Time,
  Random,
}

/// Wall-clock seed captured by the time method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeed {
  pub year:   i32,
  pub month:  u32,
  pub day:    u32,
  pub hour:   u32,
  pub minute: u32,
}

impl TimeSeed {
  pub fn from_datetime(now: &DateTime<Local>) -> Self {
    Self {
      year:   now.year(),
      month:  now.month(),
      day:    now.day(),
      hour:   now.hour(),
      minute: now.minute(),
    }
  }
}

/// Method-specific data carried by an input result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "data", rename_all = "lowercase")]
pub enum InputPayload {
  /// Six coin sums, bottom line first.
  Coins(Vec<u8>),
  /// Digits typed by the user.
  Numbers(Vec<u8>),
  Time(TimeSeed),
  /// Six line values, bottom line first.
  Random(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivinationInputResult {
  #[serde(flatten)]
  pub payload:   InputPayload,
  pub timestamp: DateTime<Utc>,
}

impl DivinationInputResult {
  pub fn new(payload: InputPayload, timestamp: DateTime<Utc>) -> Self {
    Self { payload, timestamp }
  }

  pub fn method(&self) -> DivinationMethod {
    match self.payload {
      InputPayload::Coins(_) => DivinationMethod::Coins,
      InputPayload::Numbers(_) => DivinationMethod::Numbers,
      InputPayload::Time(_) => DivinationMethod::Time,
      InputPayload::Random(_) => DivinationMethod::Random,
    }
  }

  /// Classical line values, for the methods that draw them directly.
  pub fn line_values(&self) -> Option<Vec<LineValue>> {
    match &self.payload {
      InputPayload::Coins(v) | InputPayload::Random(v) if v.len() == THROW_COUNT => v
        .iter()
        .map(|n| LineValue::try_from(*n).ok())
        .collect(),
      _ => None,
    }
  }
}

// ─── Drawing ─────────────────────────────────────────────────────────────────

/// Sum of three coin flips, each heads = 3, tails = 2.
pub fn toss_coins<R: Rng + ?Sized>(rng: &mut R) -> u8 {
  (0..3).map(|_| if rng.gen_bool(0.5) { 3 } else { 2 }).sum()
}

/// Six values uniformly in 6..=9.
pub fn random_lines<R: Rng + ?Sized>(rng: &mut R) -> Vec<u8> {
  (0..THROW_COUNT).map(|_| rng.gen_range(6..=9)).collect()
}

/// Keep the digit characters of `input`; `None` with fewer than two.
pub fn parse_digits(input: &str) -> Option<Vec<u8>> {
  let digits: Vec<u8> = input
    .chars()
    .filter_map(|c| c.to_digit(10))
    .map(|d| d as u8)
    .collect();
  (digits.len() >= MIN_DIGITS).then_some(digits)
}

// ─── Staged coin throws ──────────────────────────────────────────────────────

/// What one [`CoinThrowSequence::advance`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinStep {
  /// The next throw is not due yet.
  Waiting,
  /// Throw number `index` (0-based) landed on `sum`.
  Thrown { index: usize, sum: u8 },
  /// The sixth throw landed; the sequence is complete.
  Finished(DivinationInputResult),
}

/// Six coin throws staged one delay apart.
///
/// The sequence is driven by the caller's clock; dropping it cancels it.
#[derive(Debug, Clone)]
pub struct CoinThrowSequence {
  throws:   Vec<u8>,
  next_due: Instant,
  delay:    Duration,
}

impl CoinThrowSequence {
  pub fn start(now: Instant) -> Self { Self::with_delay(now, COIN_THROW_DELAY) }

  pub fn with_delay(now: Instant, delay: Duration) -> Self {
    Self { throws: Vec::with_capacity(THROW_COUNT), next_due: now + delay, delay }
  }

  /// Throws so far, bottom line first.
  pub fn throws(&self) -> &[u8] { &self.throws }

  pub fn is_finished(&self) -> bool { self.throws.len() == THROW_COUNT }

  /// Discard the throws and start over from `now`.
  pub fn restart(&mut self, now: Instant) {
    self.throws.clear();
    self.next_due = now + self.delay;
  }

  /// Make at most one throw if it is due.
  pub fn advance<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> CoinStep {
    if self.is_finished() || now < self.next_due {
      return CoinStep::Waiting;
    }
    let sum = toss_coins(rng);
    self.throws.push(sum);
    self.next_due = now + self.delay;

    if self.is_finished() {
      CoinStep::Finished(DivinationInputResult::new(
        InputPayload::Coins(self.throws.clone()),
        Utc::now(),
      ))
    } else {
      CoinStep::Thrown { index: self.throws.len() - 1, sum }
    }
  }
}

// ─── Selector ────────────────────────────────────────────────────────────────

/// State behind the method picker: the chosen method, the digit field, and
/// any coin sequence in flight.
#[derive(Debug, Clone, Default)]
pub struct MethodSelector {
  method:     DivinationMethod,
  pub digits: String,
  coins:      Option<CoinThrowSequence>,
  /// Sums of the last coin sequence, kept for display after it ends.
  last_coins: Vec<u8>,
}

impl MethodSelector {
  pub fn method(&self) -> DivinationMethod { self.method }

  /// Switch method; cancels a coin sequence in flight.
  pub fn select(&mut self, method: DivinationMethod) {
    if method != self.method {
      self.cancel();
      self.method = method;
    }
  }

  pub fn is_throwing(&self) -> bool { self.coins.is_some() }

  /// Coin sums to display: the running sequence, else the last one.
  pub fn coin_display(&self) -> &[u8] {
    self
      .coins
      .as_ref()
      .map(CoinThrowSequence::throws)
      .unwrap_or(self.last_coins.as_slice())
  }

  /// Whether the generate action is enabled.
  pub fn can_generate(&self) -> bool {
    match self.method {
      DivinationMethod::Coins => !self.is_throwing(),
      DivinationMethod::Numbers => parse_digits(&self.digits).is_some(),
      DivinationMethod::Time | DivinationMethod::Random => true,
    }
  }

  /// Run the generate action. Immediate methods return their result; the
  /// coin method starts a sequence and returns `None` until [`tick`] finishes
  /// it.
  ///
  /// [`tick`]: Self::tick
  pub fn generate<R: Rng + ?Sized>(
    &mut self,
    now: Instant,
    local_now: DateTime<Local>,
    rng: &mut R,
  ) -> Option<DivinationInputResult> {
    if !self.can_generate() {
      return None;
    }
    let timestamp = local_now.with_timezone(&Utc);
    match self.method {
      DivinationMethod::Coins => {
        self.last_coins.clear();
        self.coins = Some(CoinThrowSequence::start(now));
        None
      }
      DivinationMethod::Numbers => parse_digits(&self.digits)
        .map(|d| DivinationInputResult::new(InputPayload::Numbers(d), timestamp)),
      DivinationMethod::Time => Some(DivinationInputResult::new(
        InputPayload::Time(TimeSeed::from_datetime(&local_now)),
        timestamp,
      )),
      DivinationMethod::Random => Some(DivinationInputResult::new(
        InputPayload::Random(random_lines(rng)),
        timestamp,
      )),
    }
  }

  /// Advance a running coin sequence; returns the result when it completes.
  pub fn tick<R: Rng + ?Sized>(
    &mut self,
    now: Instant,
    rng: &mut R,
  ) -> Option<DivinationInputResult> {
    let seq = self.coins.as_mut()?;
    match seq.advance(now, rng) {
      CoinStep::Finished(result) => {
        self.last_coins = seq.throws().to_vec();
        self.coins = None;
        Some(result)
      }
      CoinStep::Waiting | CoinStep::Thrown { .. } => None,
    }
  }

  /// Abandon a running coin sequence.
  pub fn cancel(&mut self) {
    self.coins = None;
  }

  /// Back to a blank selector, keeping the chosen method.
  pub fn clear(&mut self) {
    self.cancel();
    self.digits.clear();
    self.last_coins.clear();
  }
}
