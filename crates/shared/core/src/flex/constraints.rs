use serde::{Deserialize, Serialize};

/// Numeric bounds for flexibility activation
///
/// All durations are expressed in slots (time steps of the simulation).
/// Values are immutable once built; use [`FlexConstraints::builder`] or
/// [`FlexConstraints::to_builder`] to derive new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexConstraints {
    inter_activation_time: u32,
    activation_duration: u32,
    maximum_activations: u32,
    required_activations: u32,
    providers: u32,
    horizon_slots: u32,
    slots_per_hour: u32,
}

impl FlexConstraints {
    /// No flexibility available at all
    pub const NO_FLEX: FlexConstraints = FlexConstraints {
        inter_activation_time: 0,
        activation_duration: 0,
        maximum_activations: 0,
        required_activations: 0,
        providers: 0,
        horizon_slots: 96,
        slots_per_hour: 4,
    };

    /// Reserve product defaults: 2 slot activations, 12 slots of rest, 40 activations
    pub const R3DP: FlexConstraints = FlexConstraints {
        inter_activation_time: 12,
        activation_duration: 2,
        maximum_activations: 40,
        required_activations: 0,
        providers: 0,
        horizon_slots: 96,
        slots_per_hour: 4,
    };

    pub fn builder() -> FlexConstraintsBuilder {
        FlexConstraintsBuilder {
            inner: Self::R3DP,
        }
    }

    /// Builder seeded with the values of `self`
    pub fn to_builder(&self) -> FlexConstraintsBuilder {
        FlexConstraintsBuilder { inner: *self }
    }

    /// Slots that must elapse between two activations
    pub fn inter_activation_time(&self) -> u32 {
        self.inter_activation_time
    }

    /// Slots a single activation lasts
    pub fn activation_duration(&self) -> u32 {
        self.activation_duration
    }

    pub fn maximum_activations(&self) -> u32 {
        self.maximum_activations
    }

    /// Activations the grid needs from every provider over the horizon
    pub fn required_activations(&self) -> u32 {
        self.required_activations
    }

    pub fn providers(&self) -> u32 {
        self.providers
    }

    pub fn horizon_slots(&self) -> u32 {
        self.horizon_slots
    }

    pub fn slots_per_hour(&self) -> u32 {
        self.slots_per_hour
    }

    /// Length of one slot in hours
    pub fn slot_hours(&self) -> f64 {
        if self.slots_per_hour == 0 {
            return 0.0;
        }
        1.0 / f64::from(self.slots_per_hour)
    }

    /// Copy of these constraints scoped to `n` providers
    pub fn for_providers(&self, n: usize) -> Self {
        Self {
            providers: u32::try_from(n).unwrap_or(u32::MAX),
            ..*self
        }
    }

    /// Largest number of activations one provider can fit in the horizon
    ///
    /// `k` activations need `k * duration + (k - 1) * rest` slots.
    pub fn max_feasible_activations(&self) -> u32 {
        if self.activation_duration == 0 || self.activation_duration > self.horizon_slots {
            return 0;
        }
        let period = u64::from(self.activation_duration) + u64::from(self.inter_activation_time);
        let fit = (u64::from(self.horizon_slots) + u64::from(self.inter_activation_time)) / period;
        let fit = u32::try_from(fit).unwrap_or(u32::MAX);
        fit.min(self.maximum_activations)
    }

    /// True when no activation can ever happen under these bounds
    pub fn is_no_flex(&self) -> bool {
        self.max_feasible_activations() == 0
    }
}

impl Default for FlexConstraints {
    fn default() -> Self {
        Self::R3DP
    }
}

/// Builder for [`FlexConstraints`], starting from the reserve product defaults
#[derive(Debug, Clone)]
pub struct FlexConstraintsBuilder {
    inner: FlexConstraints,
}

impl FlexConstraintsBuilder {
    pub fn inter_activation_time(mut self, slots: u32) -> Self {
        self.inner.inter_activation_time = slots;
        self
    }

    pub fn activation_duration(mut self, slots: u32) -> Self {
        self.inner.activation_duration = slots;
        self
    }

    pub fn maximum_activations(mut self, activations: u32) -> Self {
        self.inner.maximum_activations = activations;
        self
    }

    pub fn required_activations(mut self, activations: u32) -> Self {
        self.inner.required_activations = activations;
        self
    }

    pub fn providers(mut self, providers: u32) -> Self {
        self.inner.providers = providers;
        self
    }

    pub fn horizon_slots(mut self, slots: u32) -> Self {
        self.inner.horizon_slots = slots;
        self
    }

    pub fn slots_per_hour(mut self, slots: u32) -> Self {
        self.inner.slots_per_hour = slots;
        self
    }

    pub fn build(self) -> FlexConstraints {
        self.inner
    }
}
