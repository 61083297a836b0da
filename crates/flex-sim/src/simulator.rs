//! Time-step simulation loop

use std::cell::RefCell;
use std::rc::Rc;

use gridflex_clock::SimulationClock;
use gridflex_core::{Event, EventValue, TimeCount, attributes, event_types};
use gridflex_ports::{KernelError, KernelResult, Listener};

use crate::agenda::Agenda;
use crate::bus::EventBus;
use crate::event::EventFactory;

/// Attach one attribute to an event built by the factory
pub(crate) fn attach(
    event: Event,
    key: &str,
    value: impl Into<EventValue>,
) -> KernelResult<Event> {
    event.with_attribute(key, value).map_err(KernelError::invalid)
}

/// Access to the running simulation from inside a step hook
pub struct StepContext<'a> {
    time: TimeCount,
    events: &'a EventFactory,
    bus: &'a mut EventBus,
    agenda: &'a mut Agenda,
}

impl StepContext<'_> {
    /// Clock count of the current step
    pub fn time(&self) -> TimeCount {
        self.time
    }

    pub fn build(&self, event_type: &str) -> KernelResult<Event> {
        self.events.build(event_type)
    }

    pub fn post(&mut self, event: &Event) -> usize {
        self.bus.post(event)
    }

    /// Schedule an event for a later step
    pub fn schedule(&mut self, at: TimeCount, event: Event) -> KernelResult<()> {
        if at <= self.time {
            return Err(KernelError::invalid(format!(
                "Cannot schedule at {} from step {}",
                at, self.time
            )));
        }
        self.agenda.schedule(at, event);
        Ok(())
    }
}

/// Drives a clock over a fixed number of steps
///
/// Every run posts `simulation:started`, then for each step advances the
/// clock by one, posts `clock:tick`, posts the agenda events due at that
/// time and calls the step hook. It ends with `simulation:stopped`.
#[derive(Debug)]
pub struct Simulator {
    duration: TimeCount,
    clock: SimulationClock,
    events: EventFactory,
    bus: EventBus,
    agenda: Agenda,
}

impl Simulator {
    pub fn new(duration: TimeCount, events: EventFactory) -> KernelResult<Self> {
        if duration == 0 {
            return Err(KernelError::invalid("Simulation duration must be positive"));
        }
        events.ensure_registered([
            event_types::SIMULATION_STARTED,
            event_types::SIMULATION_STOPPED,
            event_types::CLOCK_TICK,
        ])?;

        Ok(Self {
            duration,
            clock: SimulationClock::new(),
            events,
            bus: EventBus::new(),
            agenda: Agenda::new(),
        })
    }

    pub fn duration(&self) -> TimeCount {
        self.duration
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn events(&self) -> &EventFactory {
        &self.events
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn register<L: Listener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        self.bus.register(listener);
    }

    pub fn register_dyn(&mut self, listener: &Rc<RefCell<dyn Listener>>) {
        self.bus.register_dyn(listener);
    }

    pub fn schedule(&mut self, at: TimeCount, event: Event) {
        self.agenda.schedule(at, event);
    }

    /// Run without a step hook
    pub fn run(&mut self) -> KernelResult<TimeCount> {
        self.run_with(|_| Ok(()))
    }

    /// Run the loop, calling `hook` after the events of every step
    ///
    /// Returns the final clock count. The clock is reset first, so a
    /// simulator can be run again.
    pub fn run_with<F>(&mut self, mut hook: F) -> KernelResult<TimeCount>
    where
        F: FnMut(&mut StepContext<'_>) -> KernelResult<()>,
    {
        self.clock.reset();
        let progress_every = (self.duration / 10).max(1);

        log::debug!("Simulation started for {} steps", self.duration);
        let started = self.events.build(event_types::SIMULATION_STARTED)?;
        let started = attach(started, attributes::CLOCKTIME, self.clock.time_count())?;
        self.bus.post(&started);

        for step in 1..=self.duration {
            self.clock.advance(1)?;
            let now = self.clock.time_count();

            let tick = self.events.build(event_types::CLOCK_TICK)?;
            let tick = attach(tick, attributes::CLOCKTIME, now)?;
            self.bus.post(&tick);

            for event in self.agenda.pop_due(now) {
                self.bus.post(&event);
            }

            let mut ctx = StepContext {
                time: now,
                events: &self.events,
                bus: &mut self.bus,
                agenda: &mut self.agenda,
            };
            hook(&mut ctx)?;

            if step % progress_every == 0 {
                log::debug!(
                    "Simulation progress: {}% (step {}/{})",
                    step * 100 / self.duration,
                    step,
                    self.duration
                );
            }
        }

        let stopped = self.events.build(event_types::SIMULATION_STOPPED)?;
        let stopped = attach(stopped, attributes::CLOCKTIME, self.clock.time_count())?;
        self.bus.post(&stopped);
        log::debug!("Simulation stopped at {}", self.clock.time_count());

        Ok(self.clock.time_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventRecorder;

    fn recorded(sim: &mut Simulator) -> Rc<RefCell<EventRecorder>> {
        let recorder = Rc::new(RefCell::new(EventRecorder::new()));
        sim.register(&recorder);
        recorder
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = Simulator::new(0, EventFactory::standard()).unwrap_err();
        assert!(matches!(err, KernelError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_kernel_types_rejected() {
        let err = Simulator::new(5, EventFactory::empty()).unwrap_err();
        assert!(matches!(err, KernelError::UnknownEventType(_)));
    }

    #[test]
    fn test_lifecycle_events() {
        let mut sim = Simulator::new(3, EventFactory::standard()).unwrap();
        let recorder = recorded(&mut sim);

        assert_eq!(sim.run().unwrap(), 3);

        let recorder = recorder.borrow();
        let types: Vec<_> = recorder.events().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "simulation:started",
                "clock:tick",
                "clock:tick",
                "clock:tick",
                "simulation:stopped"
            ]
        );
        let times: Vec<_> = recorder
            .events()
            .iter()
            .map(|e| e.int(attributes::CLOCKTIME))
            .collect();
        assert_eq!(times, vec![Some(0), Some(1), Some(2), Some(3), Some(3)]);
    }

    #[test]
    fn test_scheduled_events_follow_their_tick() {
        let mut sim = Simulator::new(4, EventFactory::standard()).unwrap();
        let recorder = recorded(&mut sim);
        sim.schedule(2, Event::new("custom:due"));

        sim.run().unwrap();

        let recorder = recorder.borrow();
        let position = recorder
            .events()
            .iter()
            .position(|e| e.is("custom:due"))
            .unwrap();
        let previous = &recorder.events()[position - 1];
        assert!(previous.is(event_types::CLOCK_TICK));
        assert_eq!(previous.int(attributes::CLOCKTIME), Some(2));
    }

    #[test]
    fn test_hook_can_post_and_schedule() {
        let mut sim = Simulator::new(3, EventFactory::standard()).unwrap();
        let recorder = recorded(&mut sim);

        sim.run_with(|ctx| {
            if ctx.time() == 1 {
                let event = ctx.build(event_types::FLEX_ACTIVATION)?;
                ctx.schedule(3, event)?;
                assert!(ctx.schedule(1, Event::new("too:late")).is_err());
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(recorder.borrow().count(event_types::FLEX_ACTIVATION), 1);
        assert!(sim.agenda().is_empty());
    }

    #[test]
    fn test_hook_error_aborts_run() {
        let mut sim = Simulator::new(10, EventFactory::standard()).unwrap();
        let err = sim
            .run_with(|ctx| {
                if ctx.time() == 4 {
                    return Err(KernelError::fault("boom"));
                }
                Ok(())
            })
            .unwrap_err();

        assert_eq!(err, KernelError::SimulationFault("boom".into()));
        assert_eq!(sim.clock().time_count(), 4);
    }

    #[test]
    fn test_rerun_resets_clock() {
        let mut sim = Simulator::new(5, EventFactory::standard()).unwrap();
        assert_eq!(sim.run().unwrap(), 5);
        assert_eq!(sim.run().unwrap(), 5);
    }
}
