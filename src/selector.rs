//! Victim selection among eligible group members.

use rand::Rng;

use crate::asg::Member;
use crate::error::DisruptionError;

/// Picks an index in `0..len`. `len` is never zero.
pub trait VictimChooser: Send + Sync {
    fn choose(&self, len: usize) -> usize;
}

/// Uniform choice backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChooser;

impl VictimChooser for RandomChooser {
    fn choose(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Filter to InService + Healthy members and pick one of them.
pub fn select_victim<'a>(
    group_name: &str,
    members: &'a [Member],
    chooser: &dyn VictimChooser,
) -> Result<&'a Member, DisruptionError> {
    let eligible: Vec<&Member> = members.iter().filter(|m| m.is_eligible()).collect();

    tracing::debug!(
        autoscaling_group_name = %group_name,
        total_members = members.len(),
        eligible_members = eligible.len(),
        "Filtered eligible members"
    );

    if eligible.is_empty() {
        return Err(DisruptionError::NoEligibleTarget(group_name.to_string()));
    }

    // Clamp so a misbehaving chooser can never reach outside the eligible set
    let index = chooser.choose(eligible.len()).min(eligible.len() - 1);
    Ok(eligible[index])
}
