use super::DistributionSample;

/// Whether `current` can be accumulated elementwise on top of `previous`.
///
/// Two samples are compatible iff their `phi`, `theta` and `energy` arrays and their
/// `mass` are **exactly** equal. There is no tolerance: within one instrument mode the
/// bin geometry is constant, so any difference marks a mode transition.
///
/// A missing `previous` (start of an accumulation) is always compatible.
pub fn bins_compatible(previous: Option<&DistributionSample>, current: &DistributionSample) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    previous.mass() == current.mass()
        && previous.phi() == current.phi()
        && previous.theta() == current.theta()
        && previous.energy() == current.energy()
}
