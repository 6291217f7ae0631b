// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use sim_tick::{Event, Kernel};

/// A distinguished point within each clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    /// The rising edge.
    Posedge,
    /// The falling edge.
    Negedge,
    /// Whichever edge comes next given the current level of the clock.
    Anyedge,
    /// The point at which stable data is read.
    Sample,
    /// The point at which new data is driven.
    Setedge,
}

impl Landmark {
    /// Every landmark, in declaration order.
    pub const ALL: [Self; 5] = [Self::Posedge, Self::Negedge, Self::Anyedge, Self::Sample, Self::Setedge];

    /// Returns `true` for the rising and falling edges and for any-edge.
    #[must_use]
    pub fn is_edge(self) -> bool {
        matches!(self, Self::Posedge | Self::Negedge | Self::Anyedge)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Posedge => "posedge",
            Self::Negedge => "negedge",
            Self::Anyedge => "anyedge",
            Self::Sample => "sample",
            Self::Setedge => "setedge",
        };

        f.write_str(name)
    }
}

/// One event per landmark, all bound to the same kernel.
#[derive(Debug, Clone)]
pub(crate) struct LandmarkEvents {
    posedge: Event,
    negedge: Event,
    anyedge: Event,
    sample: Event,
    setedge: Event,
}

impl LandmarkEvents {
    pub fn new(kernel: &Kernel) -> Self {
        Self {
            posedge: kernel.event(),
            negedge: kernel.event(),
            anyedge: kernel.event(),
            sample: kernel.event(),
            setedge: kernel.event(),
        }
    }

    pub fn get(&self, landmark: Landmark) -> &Event {
        match landmark {
            Landmark::Posedge => &self.posedge,
            Landmark::Negedge => &self.negedge,
            Landmark::Anyedge => &self.anyedge,
            Landmark::Sample => &self.sample,
            Landmark::Setedge => &self.setedge,
        }
    }
}
