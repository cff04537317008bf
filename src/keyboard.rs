//! The device context.
//!
//! [`Keyboard`] owns every piece of mutable state the firmware has and is
//! driven by one entry point, [`Keyboard::handle`]. Hardware is reached
//! only through the [`BleLink`] and [`Indicator`] collaborators passed in
//! on each call, so the whole device can be exercised on the host.

use crate::config::{INACTIVITY_TIMEOUT_TICKS, PAIR_HOLD_THRESHOLD_TICKS};
use crate::error::Error;
use crate::inactivity::InactivityMonitor;
use crate::indicator::{Indicator, IndicatorController, Mode};
use crate::keys::{Chord, ChordAccumulator, Debouncer, RawSample};
use crate::link::{self, BleLink, ConnectionState, LinkEvent};
use crate::power_logic::{PowerAction, PowerButton, SleepReason, SleepRequest, WakeSources};

/// Everything that can happen to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Poll clock tick carrying this tick's raw input sample.
    Poll(RawSample),
    /// Blink clock tick.
    Blink,
    /// Inactivity clock tick.
    Inactivity,
    Link(LinkEvent),
}

/// What the caller should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    Continue,
    /// Hand the request to [`crate::power_logic::shutdown`]. The
    /// indicator is already off.
    Sleep(SleepRequest),
}

pub struct Keyboard {
    debouncer: Debouncer,
    chord: ChordAccumulator,
    power: PowerButton,
    inactivity: InactivityMonitor,
    connection: ConnectionState,
    indicator: IndicatorController,
    asleep: bool,
}

impl Keyboard {
    /// Zeroed context: nothing pressed, not connected, no pattern shown.
    pub const fn init() -> Self {
        Self {
            debouncer: Debouncer::new(),
            chord: ChordAccumulator::new(),
            power: PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS),
            inactivity: InactivityMonitor::new(INACTIVITY_TIMEOUT_TICKS),
            connection: ConnectionState::new(),
            indicator: IndicatorController::new(),
            asleep: false,
        }
    }

    /// Boot transition: start advertising and show it.
    pub fn start<L: BleLink, I: Indicator>(&mut self, link: &mut L, led: &mut I) {
        info!("Keyboard: starting");
        self.indicator.set_mode(Mode::Advertising, led);
        link.start_advertising();
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Keys gathered for the chord in progress.
    pub fn pending_chord(&self) -> Chord {
        self.chord.pending()
    }

    pub fn indicator_mode(&self) -> Option<Mode> {
        self.indicator.mode()
    }

    /// `true` once a sleep has been handed out.
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn handle<L: BleLink, I: Indicator>(
        &mut self,
        event: Event,
        link: &mut L,
        led: &mut I,
    ) -> Flow {
        if self.asleep {
            return Flow::Continue;
        }

        match event {
            Event::Poll(sample) => self.poll(sample, link, led),
            Event::Blink => {
                self.indicator.blink(led);
                Flow::Continue
            }
            Event::Inactivity => {
                if self.inactivity.tick() {
                    self.sleep(SleepReason::Inactivity, led)
                } else {
                    Flow::Continue
                }
            }
            Event::Link(event) => self.on_link(event, link, led),
        }
    }

    fn poll<L: BleLink, I: Indicator>(
        &mut self,
        sample: RawSample,
        link: &mut L,
        led: &mut I,
    ) -> Flow {
        if self.debouncer.update(sample) {
            self.inactivity.reset();
        }
        let state = self.debouncer.state();

        // Chord first, so a chord released on the same tick as the power
        // button still goes out before sleep.
        if let Some(chord) = self.chord.update(state.chord) {
            self.send(chord, link);
        }

        match self.power.update(state.power, self.connection.subscribed) {
            Some(PowerAction::EnterPairing) => {
                info!("Keyboard: entering pairing mode");
                self.connection.pairing_mode = true;
                link.set_pairing_mode(true);
                self.indicator.set_mode(Mode::Pairing, led);
                link.start_advertising();
                Flow::Continue
            }
            Some(PowerAction::Sleep) => self.sleep(SleepReason::PowerButton, led),
            None => Flow::Continue,
        }
    }

    #[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
    fn send<L: BleLink>(&mut self, chord: Chord, link: &mut L) {
        match link::dispatch(&self.connection, link, chord) {
            Ok(()) => debug!("Keyboard: chord {=u8:#b} sent", chord.bits()),
            Err(Error::InvalidState) => {
                warn!("Keyboard: chord {=u8:#b} dropped, no subscriber", chord.bits())
            }
            Err(e) => warn!("Keyboard: chord {=u8:#b} dropped: {}", chord.bits(), e),
        }
    }

    fn on_link<L: BleLink, I: Indicator>(
        &mut self,
        event: LinkEvent,
        link: &mut L,
        led: &mut I,
    ) -> Flow {
        info!("Keyboard: link {}", event);
        self.connection.apply(event);

        match event {
            LinkEvent::Connected => {
                self.inactivity.reset();
                self.indicator.set_mode(Mode::Connected, led);
            }
            LinkEvent::Disconnected => {
                let mode = if self.connection.pairing_mode {
                    Mode::Pairing
                } else {
                    Mode::Advertising
                };
                self.indicator.set_mode(mode, led);
                link.start_advertising();
            }
            LinkEvent::NotificationsEnabled | LinkEvent::NotificationsDisabled => {}
            LinkEvent::AdvertisingTimedOut => {
                if !self.connection.connected {
                    return self.sleep(SleepReason::AdvertisingTimeout, led);
                }
            }
        }
        Flow::Continue
    }

    fn sleep<I: Indicator>(&mut self, reason: SleepReason, led: &mut I) -> Flow {
        info!("Keyboard: sleep requested ({})", reason);
        self.indicator.set_mode(Mode::Sleeping, led);
        self.asleep = true;
        Flow::Sleep(SleepRequest {
            reason,
            wake: WakeSources::ALL,
        })
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::indicator::Pattern;

    #[derive(Default)]
    struct FakeLink {
        sent: Vec<u8>,
        advertise_calls: usize,
        pairing_published: bool,
    }

    impl BleLink for FakeLink {
        fn notify(&mut self, value: u8) -> Result<()> {
            self.sent.push(value);
            Ok(())
        }

        fn start_advertising(&mut self) {
            self.advertise_calls += 1;
        }

        fn set_pairing_mode(&mut self, enabled: bool) {
            self.pairing_published = enabled;
        }
    }

    #[derive(Default)]
    struct FakeLed {
        applied: Vec<Pattern>,
        toggles: usize,
    }

    impl Indicator for FakeLed {
        fn apply(&mut self, pattern: Pattern) {
            self.applied.push(pattern);
        }

        fn toggle(&mut self) {
            self.toggles += 1;
        }
    }

    struct Rig {
        kb: Keyboard,
        link: FakeLink,
        led: FakeLed,
    }

    impl Rig {
        fn booted() -> Self {
            let mut rig = Self {
                kb: Keyboard::init(),
                link: FakeLink::default(),
                led: FakeLed::default(),
            };
            rig.kb.start(&mut rig.link, &mut rig.led);
            rig
        }

        fn subscribed() -> Self {
            let mut rig = Self::booted();
            rig.link_event(LinkEvent::Connected);
            rig.link_event(LinkEvent::NotificationsEnabled);
            rig
        }

        fn event(&mut self, event: Event) -> Flow {
            self.kb.handle(event, &mut self.link, &mut self.led)
        }

        fn link_event(&mut self, event: LinkEvent) -> Flow {
            self.event(Event::Link(event))
        }

        fn poll(&mut self, chord: u8, power: bool) -> Flow {
            self.event(Event::Poll(RawSample::new(Chord::from_bits(chord), power)))
        }

        /// Hold the power button for `ticks` raw samples, then release.
        fn hold_power(&mut self, ticks: usize) -> Flow {
            for _ in 0..ticks {
                self.poll(0, true);
            }
            self.poll(0, false);
            self.poll(0, false)
        }
    }

    #[test]
    fn init_is_zeroed() {
        let kb = Keyboard::init();
        assert_eq!(kb.connection(), ConnectionState::new());
        assert!(kb.pending_chord().is_empty());
        assert_eq!(kb.indicator_mode(), None);
        assert!(!kb.is_asleep());
    }

    #[test]
    fn start_advertises_with_slow_blink() {
        let rig = Rig::booted();
        assert_eq!(rig.link.advertise_calls, 1);
        assert_eq!(rig.kb.indicator_mode(), Some(Mode::Advertising));
        assert_eq!(rig.led.applied, [Pattern::Blink { period_ms: 700 }]);
    }

    #[test]
    fn chord_goes_out_on_release() {
        let mut rig = Rig::subscribed();
        for bits in [0b001, 0b001, 0b011, 0b011, 0b010, 0b010, 0, 0] {
            assert_eq!(rig.poll(bits, false), Flow::Continue);
        }
        assert_eq!(rig.link.sent, [0b011]);
    }

    #[test]
    fn chord_without_subscriber_is_dropped() {
        let mut rig = Rig::booted();
        rig.link_event(LinkEvent::Connected);
        for bits in [0b100, 0b100, 0, 0] {
            rig.poll(bits, false);
        }
        assert!(rig.link.sent.is_empty());
        assert!(rig.kb.pending_chord().is_empty());
    }

    #[test]
    fn one_tick_glitch_is_ignored() {
        let mut rig = Rig::subscribed();
        for bits in [0, 1, 0, 0, 0] {
            rig.poll(bits, false);
        }
        assert!(rig.link.sent.is_empty());
    }

    #[test]
    fn connect_shows_steady_on() {
        let mut rig = Rig::booted();
        rig.link_event(LinkEvent::Connected);
        assert_eq!(rig.kb.indicator_mode(), Some(Mode::Connected));
        assert_eq!(rig.led.applied.last(), Some(&Pattern::On));
    }

    #[test]
    fn disconnect_readvertises_and_clears_flags() {
        let mut rig = Rig::subscribed();
        rig.link_event(LinkEvent::Disconnected);

        assert_eq!(rig.link.advertise_calls, 2);
        assert_eq!(rig.kb.indicator_mode(), Some(Mode::Advertising));
        assert!(!rig.kb.connection().connected);
        assert!(!rig.kb.connection().subscribed);
    }

    #[test]
    fn blink_ticks_follow_the_pattern() {
        let mut rig = Rig::booted();
        rig.event(Event::Blink);
        rig.event(Event::Blink);
        assert_eq!(rig.led.toggles, 2);

        rig.link_event(LinkEvent::Connected);
        rig.event(Event::Blink);
        assert_eq!(rig.led.toggles, 2);
    }

    #[test]
    fn advertising_timeout_sleeps_only_when_unconnected() {
        let mut rig = Rig::subscribed();
        assert_eq!(rig.link_event(LinkEvent::AdvertisingTimedOut), Flow::Continue);

        let mut rig = Rig::booted();
        let flow = rig.link_event(LinkEvent::AdvertisingTimedOut);
        assert_eq!(
            flow,
            Flow::Sleep(SleepRequest {
                reason: SleepReason::AdvertisingTimeout,
                wake: WakeSources::ALL,
            })
        );
        assert_eq!(rig.led.applied.last(), Some(&Pattern::Off));
    }

    #[test]
    fn inactivity_sleeps_after_timeout() {
        let mut rig = Rig::booted();
        for _ in 1..INACTIVITY_TIMEOUT_TICKS {
            assert_eq!(rig.event(Event::Inactivity), Flow::Continue);
        }
        match rig.event(Event::Inactivity) {
            Flow::Sleep(request) => assert_eq!(request.reason, SleepReason::Inactivity),
            Flow::Continue => panic!("expected sleep"),
        }
        assert!(rig.kb.is_asleep());
    }

    #[test]
    fn input_change_restarts_inactivity() {
        let mut rig = Rig::booted();
        for _ in 1..INACTIVITY_TIMEOUT_TICKS {
            rig.event(Event::Inactivity);
        }
        // Two identical samples make a debounced change.
        rig.poll(0b1, false);
        rig.poll(0b1, false);
        assert_eq!(rig.event(Event::Inactivity), Flow::Continue);
    }

    #[test]
    fn connect_restarts_inactivity() {
        let mut rig = Rig::booted();
        for _ in 1..INACTIVITY_TIMEOUT_TICKS {
            rig.event(Event::Inactivity);
        }
        rig.link_event(LinkEvent::Connected);
        assert_eq!(rig.event(Event::Inactivity), Flow::Continue);
    }

    #[test]
    fn events_after_sleep_are_ignored() {
        let mut rig = Rig::subscribed();
        rig.link_event(LinkEvent::Disconnected);
        assert!(matches!(
            rig.link_event(LinkEvent::AdvertisingTimedOut),
            Flow::Sleep(_)
        ));

        let applied = rig.led.applied.len();
        rig.link_event(LinkEvent::Connected);
        rig.link_event(LinkEvent::NotificationsEnabled);
        for bits in [1, 1, 0, 0] {
            assert_eq!(rig.poll(bits, false), Flow::Continue);
        }
        rig.event(Event::Blink);

        assert!(rig.link.sent.is_empty());
        assert_eq!(rig.led.applied.len(), applied);
        assert_eq!(rig.kb.indicator_mode(), Some(Mode::Sleeping));
    }

    #[test]
    fn pairing_entry_publishes_pairing_mode() {
        let mut rig = Rig::booted();
        assert!(!rig.link.pairing_published);

        assert_eq!(rig.hold_power(60), Flow::Continue);
        assert!(rig.kb.connection().pairing_mode);
        assert!(rig.link.pairing_published);
        assert_eq!(rig.link.advertise_calls, 2);
    }

    #[test]
    fn long_hold_with_unsubscribed_central_enters_pairing() {
        let mut rig = Rig::booted();
        rig.link_event(LinkEvent::Connected);

        assert_eq!(rig.hold_power(60), Flow::Continue);
        assert!(rig.kb.connection().pairing_mode);
        assert!(rig.link.pairing_published);
        assert_eq!(rig.kb.indicator_mode(), Some(Mode::Pairing));
    }

    #[test]
    fn long_hold_with_subscribed_central_sleeps() {
        let mut rig = Rig::subscribed();
        assert!(matches!(rig.hold_power(60), Flow::Sleep(_)));
        assert!(!rig.link.pairing_published);
    }

    #[test]
    fn latest_subscription_level_wins() {
        // The BLE layer coalesces CCCD writes and may repeat a level.
        let mut rig = Rig::booted();
        rig.link_event(LinkEvent::Connected);
        rig.link_event(LinkEvent::NotificationsEnabled);
        rig.link_event(LinkEvent::NotificationsEnabled);
        assert!(rig.kb.connection().can_notify());

        rig.link_event(LinkEvent::NotificationsDisabled);
        rig.link_event(LinkEvent::NotificationsDisabled);
        assert!(!rig.kb.connection().can_notify());

        rig.link_event(LinkEvent::NotificationsEnabled);
        for bits in [0b10, 0b10, 0, 0] {
            rig.poll(bits, false);
        }
        assert_eq!(rig.link.sent, [0b10]);
    }
}
