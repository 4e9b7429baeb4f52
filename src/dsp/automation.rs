//! Automation timeline — WebAudio-style parameter automation.
//!
//! Each audio parameter carries an ordered list of automation events.
//! Linear ramps start from the previous event's time and value, exactly
//! like `AudioParam.linearRampToValueAtTime`, so an envelope is nothing
//! more than a handful of events inserted against the graph clock.

/// One scheduled change on an audio parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`.
    SetValue { value: f64, time: f64 },
    /// Ramp linearly from the previous event to `value`, arriving at `end_time`.
    LinearRamp { value: f64, end_time: f64 },
}

impl AutomationEvent {
    /// The instant at which this event's value is reached.
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::LinearRamp { end_time, .. } => end_time,
        }
    }

    /// The value held once this event has completed.
    pub fn value(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { value, .. } => value,
            AutomationEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// Ordered automation events for a single audio parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationTimeline {
    /// Value used before the first event (the parameter's intrinsic value).
    default_value: f64,
    events: Vec<AutomationEvent>,
}

impl AutomationTimeline {
    pub fn new(default_value: f64) -> Self {
        AutomationTimeline {
            default_value,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Schedule a jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    /// Schedule a linear ramp that reaches `value` at `end_time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(AutomationEvent::LinearRamp { value, end_time });
    }

    /// Drop every event after `time` and pin the parameter to whatever
    /// value it has at `time`.
    ///
    /// A ramp in flight at `time` is cut: its remaining trajectory is
    /// replaced by a hold at the interpolated value.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) {
        let held = self.value_at(time);
        self.events.retain(|e| e.time() <= time);
        self.insert(AutomationEvent::SetValue { value: held, time });
    }

    /// Fold every event completed by `time` into one step holding its
    /// value. Evaluation at or after `time` is unchanged.
    pub fn forget_before(&mut self, time: f64) {
        let done = self.events.partition_point(|e| e.time() <= time);
        if done == 0 {
            return;
        }
        let last = self.events[done - 1];
        if done == 1 && matches!(last, AutomationEvent::SetValue { .. }) {
            return;
        }
        self.events.drain(..done - 1);
        self.events[0] = AutomationEvent::SetValue {
            value: last.value(),
            time: last.time(),
        };
    }

    /// Evaluate the parameter at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default_value;
        let mut started = false;

        for event in &self.events {
            if event.time() <= time {
                prev_time = event.time();
                prev_value = event.value();
                started = true;
                continue;
            }

            // First event still in the future.
            return match *event {
                AutomationEvent::SetValue { .. } => prev_value,
                AutomationEvent::LinearRamp { value, end_time } => {
                    if !started {
                        // A ramp with no predecessor starts at the intrinsic
                        // value at time zero.
                        prev_time = 0.0;
                    }
                    let span = end_time - prev_time;
                    if span <= 0.0 {
                        value
                    } else {
                        let t = (time - prev_time) / span;
                        prev_value + (value - prev_value) * t
                    }
                }
            };
        }

        prev_value
    }

    /// Insert keeping events ordered by time; equal times keep insertion order.
    fn insert(&mut self, event: AutomationEvent) {
        let time = event.time();
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_value_before_any_event() {
        let tl = AutomationTimeline::new(0.25);
        assert!(approx(tl.value_at(0.0), 0.25));
        assert!(approx(tl.value_at(10.0), 0.25));
    }

    #[test]
    fn set_value_is_a_step() {
        let mut tl = AutomationTimeline::new(1.0);
        tl.set_value_at_time(0.0, 1.0);
        assert!(approx(tl.value_at(0.5), 1.0), "before the step");
        assert!(approx(tl.value_at(1.0), 0.0), "at the step");
        assert!(approx(tl.value_at(2.0), 0.0), "after the step");
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut tl = AutomationTimeline::new(1.0);
        tl.set_value_at_time(0.0, 1.0);
        tl.linear_ramp_to_value_at_time(1.0, 2.0);
        assert!(approx(tl.value_at(1.5), 0.5), "got {}", tl.value_at(1.5));
        assert!(approx(tl.value_at(2.0), 1.0));
        assert!(approx(tl.value_at(3.0), 1.0));
    }

    #[test]
    fn chained_ramps() {
        let mut tl = AutomationTimeline::new(1.0);
        tl.set_value_at_time(0.0, 0.0);
        tl.linear_ramp_to_value_at_time(1.0, 0.1);
        tl.linear_ramp_to_value_at_time(0.7, 0.3);
        assert!(approx(tl.value_at(0.05), 0.5));
        assert!(approx(tl.value_at(0.2), 0.85));
        assert!(approx(tl.value_at(0.3), 0.7));
    }

    #[test]
    fn cancel_and_hold_cuts_a_ramp_in_flight() {
        let mut tl = AutomationTimeline::new(1.0);
        tl.set_value_at_time(0.0, 0.0);
        tl.linear_ramp_to_value_at_time(1.0, 1.0);
        tl.cancel_and_hold_at_time(0.25);

        assert!(approx(tl.value_at(0.25), 0.25));
        assert!(
            approx(tl.value_at(0.9), 0.25),
            "ramp beyond the hold must be gone, got {}",
            tl.value_at(0.9)
        );

        tl.linear_ramp_to_value_at_time(0.0, 0.75);
        assert!(approx(tl.value_at(0.5), 0.125), "got {}", tl.value_at(0.5));
        assert!(approx(tl.value_at(0.75), 0.0));
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut tl = AutomationTimeline::new(0.0);
        tl.set_value_at_time(0.2, 1.0);
        tl.linear_ramp_to_value_at_time(0.9, 1.0);
        assert!(approx(tl.value_at(1.0), 0.9));
    }

    #[test]
    fn forgetting_the_past_keeps_the_future() {
        let mut tl = AutomationTimeline::new(1.0);
        tl.set_value_at_time(0.0, 0.0);
        tl.linear_ramp_to_value_at_time(1.0, 0.1);
        tl.linear_ramp_to_value_at_time(0.5, 0.3);
        tl.linear_ramp_to_value_at_time(0.0, 1.3);

        tl.forget_before(0.5);
        assert_eq!(
            tl.events()[0],
            AutomationEvent::SetValue { value: 0.5, time: 0.3 }
        );
        assert_eq!(tl.events().len(), 2);
        assert!(approx(tl.value_at(0.5), 0.4), "got {}", tl.value_at(0.5));
        assert!(approx(tl.value_at(0.8), 0.25));
        assert!(approx(tl.value_at(2.0), 0.0));

        tl.forget_before(5.0);
        assert_eq!(tl.events(), &[AutomationEvent::SetValue { value: 0.0, time: 1.3 }]);
    }

    #[test]
    fn forgetting_with_nothing_past_is_a_noop() {
        let mut tl = AutomationTimeline::new(0.0);
        tl.set_value_at_time(1.0, 2.0);
        tl.forget_before(1.0);
        tl.forget_before(3.0);
        assert_eq!(tl.events(), &[AutomationEvent::SetValue { value: 1.0, time: 2.0 }]);
    }

    #[test]
    fn events_stay_sorted() {
        let mut tl = AutomationTimeline::new(0.0);
        tl.set_value_at_time(3.0, 3.0);
        tl.set_value_at_time(1.0, 1.0);
        tl.set_value_at_time(2.0, 2.0);
        let times: Vec<f64> = tl.events().iter().map(|e| e.time()).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }
}
