//! Enable/disable transitions for effects.
//!
//! Each effect is recorded as enabled or disabled. Once per frame the
//! recorded state is compared with the effect's settings flag; all disables
//! run first, then all enables, each in registration order. The record is
//! updated before the hook runs so a hook observes the new state.

use std::collections::HashMap;

use crate::core::types::EffectKind;
use crate::effects::component::{LifecycleContext, PostEffect};
use crate::gpu::GraphicsDevice;
use crate::resources::HistoryBuffers;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectStates {
    states: HashMap<EffectKind, bool>,
}

impl EffectStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state; effects never observed count as disabled.
    pub fn get(&self, kind: EffectKind) -> bool {
        self.states.get(&kind).copied().unwrap_or(false)
    }

    pub fn set(&mut self, kind: EffectKind, enabled: bool) {
        self.states.insert(kind, enabled);
    }

    pub fn enabled_kinds(&self) -> Vec<EffectKind> {
        let mut kinds: Vec<EffectKind> = self
            .states
            .iter()
            .filter_map(|(&kind, &enabled)| enabled.then_some(kind))
            .collect();
        kinds.sort();
        kinds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub kind: EffectKind,
    pub transition: Transition,
}

fn notify(
    effect: &mut dyn PostEffect,
    transition: Transition,
    states: &mut EffectStates,
    device: &mut dyn GraphicsDevice,
    history: &mut HistoryBuffers,
) -> StateTransition {
    let kind = effect.kind();
    states.set(kind, transition == Transition::Enabled);
    let mut ctx = LifecycleContext {
        device,
        history,
        states,
    };
    match transition {
        Transition::Enabled => effect.on_enable(&mut ctx),
        Transition::Disabled => effect.on_disable(&mut ctx),
    }
    log::debug!("{kind} {transition:?}");
    StateTransition { kind, transition }
}

/// Fires the hooks for every effect whose settings flag differs from its
/// recorded state. Returns the transitions in the order they ran.
pub fn check_observers(
    states: &mut EffectStates,
    effects: &mut [&mut dyn PostEffect],
    device: &mut dyn GraphicsDevice,
    history: &mut HistoryBuffers,
) -> Vec<StateTransition> {
    let mut transitions = Vec::new();

    for effect in effects.iter_mut() {
        if states.get(effect.kind()) && !effect.is_enabled() {
            transitions.push(notify(&mut **effect, Transition::Disabled, states, device, history));
        }
    }
    for effect in effects.iter_mut() {
        if !states.get(effect.kind()) && effect.is_enabled() {
            transitions.push(notify(&mut **effect, Transition::Enabled, states, device, history));
        }
    }

    transitions
}

/// Disables every effect recorded as enabled, whatever its settings say.
pub fn disable_all(
    states: &mut EffectStates,
    effects: &mut [&mut dyn PostEffect],
    device: &mut dyn GraphicsDevice,
    history: &mut HistoryBuffers,
) -> Vec<StateTransition> {
    let mut transitions = Vec::new();
    for effect in effects.iter_mut() {
        if states.get(effect.kind()) {
            transitions.push(notify(&mut **effect, Transition::Disabled, states, device, history));
        }
    }
    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::component::FrameContext;
    use crate::gpu::SoftwareDevice;

    struct Probe {
        kind: EffectKind,
        enabled: bool,
        enables: usize,
        disables: usize,
        saw_state: Option<bool>,
    }

    impl Probe {
        fn new(kind: EffectKind, enabled: bool) -> Self {
            Self {
                kind,
                enabled,
                enables: 0,
                disables: 0,
                saw_state: None,
            }
        }
    }

    impl PostEffect for Probe {
        fn kind(&self) -> EffectKind {
            self.kind
        }

        fn init(&mut self, _ctx: &FrameContext<'_>) {}

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn is_active(&self) -> bool {
            self.enabled
        }

        fn on_enable(&mut self, ctx: &mut LifecycleContext<'_>) {
            self.enables += 1;
            self.saw_state = Some(ctx.states.get(self.kind));
        }

        fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
            self.disables += 1;
            self.saw_state = Some(ctx.states.get(self.kind));
        }
    }

    fn run(states: &mut EffectStates, probes: &mut [Probe]) -> Vec<StateTransition> {
        let mut device = SoftwareDevice::new();
        let mut history = HistoryBuffers::new();
        let mut effects: Vec<&mut dyn PostEffect> =
            probes.iter_mut().map(|probe| probe as &mut dyn PostEffect).collect();
        check_observers(states, &mut effects, &mut device, &mut history)
    }

    #[test]
    fn transitions_fire_once_per_change() {
        let mut states = EffectStates::new();
        let mut probes = [Probe::new(EffectKind::Bloom, true)];

        assert_eq!(run(&mut states, &mut probes).len(), 1);
        assert_eq!(run(&mut states, &mut probes).len(), 0);
        assert_eq!(probes[0].enables, 1);
        assert_eq!(probes[0].saw_state, Some(true));

        probes[0].enabled = false;
        let transitions = run(&mut states, &mut probes);
        assert_eq!(
            transitions,
            vec![StateTransition {
                kind: EffectKind::Bloom,
                transition: Transition::Disabled
            }]
        );
        assert_eq!(probes[0].disables, 1);
        assert_eq!(probes[0].saw_state, Some(false));
    }

    #[test]
    fn disables_run_before_enables() {
        let mut states = EffectStates::new();
        states.set(EffectKind::Vignette, true);
        let mut probes = [
            Probe::new(EffectKind::Bloom, true),
            Probe::new(EffectKind::Vignette, false),
        ];

        let transitions = run(&mut states, &mut probes);
        assert_eq!(transitions[0].kind, EffectKind::Vignette);
        assert_eq!(transitions[0].transition, Transition::Disabled);
        assert_eq!(transitions[1].kind, EffectKind::Bloom);
        assert_eq!(transitions[1].transition, Transition::Enabled);
    }

    #[test]
    fn disable_all_then_reenable() {
        let mut states = EffectStates::new();
        let mut probes = [
            Probe::new(EffectKind::Bloom, true),
            Probe::new(EffectKind::Grain, true),
        ];
        run(&mut states, &mut probes);

        let mut device = SoftwareDevice::new();
        let mut history = HistoryBuffers::new();
        let forced = {
            let mut effects: Vec<&mut dyn PostEffect> =
                probes.iter_mut().map(|probe| probe as &mut dyn PostEffect).collect();
            disable_all(&mut states, &mut effects, &mut device, &mut history)
        };
        assert_eq!(forced.len(), 2);
        assert!(states.enabled_kinds().is_empty());

        assert_eq!(run(&mut states, &mut probes).len(), 2);
        assert!(probes.iter().all(|probe| probe.enables == 2 && probe.disables == 1));
    }
}
