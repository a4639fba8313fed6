use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::error::{InvalidDataError, MessageKey, ServiceError};
use crate::models::{Assignment, AssignmentSet, Participant};

/// Why a single randomized attempt could not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("No allowable participants remain for giver {giver:?}")]
    NoAllowableReceiver { giver: Option<i64> },
}

/// Make one randomized pass over the givers.
///
/// Givers are visited in order. Each one draws uniformly from the receivers
/// not yet taken, excluding themselves and their explicit conflicts. With
/// `auto_conflict` set, a giver also may not draw the participant who was
/// already assigned to give to them, so no reciprocal pairs appear.
///
/// A pass can paint itself into a corner (the last giver may be left with
/// only themselves); callers retry.
pub fn assign_once<R: Rng + ?Sized>(
    participants: &[Participant],
    auto_conflict: bool,
    rng: &mut R,
) -> Result<AssignmentSet, AttemptError> {
    let mut available: Vec<&Participant> = participants.iter().collect();
    let mut assignments = AssignmentSet::new();

    for giver in participants {
        let reciprocal = if auto_conflict {
            assignments.gift_giver(giver).and_then(|p| p.id)
        } else {
            None
        };

        let allowable: Vec<usize> = available
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.id != giver.id)
            .filter(|(_, candidate)| !giver.conflicts_with(candidate))
            .filter(|(_, candidate)| reciprocal.is_none() || candidate.id != reciprocal)
            .map(|(index, _)| index)
            .collect();

        let index = *allowable
            .choose(rng)
            .ok_or(AttemptError::NoAllowableReceiver { giver: giver.id })?;

        let receiver = available.remove(index);
        assignments.push(Assignment::new(giver.clone(), receiver.clone()));
    }

    Ok(assignments)
}

/// Randomized assignment generator with a bounded number of attempts
#[derive(Debug, Clone, Copy)]
pub struct AssignmentGenerator {
    max_attempts: u32,
}

impl AssignmentGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate a complete set of assignments using the thread-local RNG
    pub fn generate(
        &self,
        participants: &[Participant],
        auto_conflict: bool,
    ) -> Result<AssignmentSet, ServiceError> {
        self.generate_with_rng(participants, auto_conflict, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        auto_conflict: bool,
        rng: &mut R,
    ) -> Result<AssignmentSet, ServiceError> {
        if self.max_attempts < 1 {
            return Err(ServiceError::internal(
                "Internal error: configured maximum attempts is invalid",
            ));
        }

        for attempt in 1..=self.max_attempts {
            match assign_once(participants, auto_conflict, rng) {
                Ok(assignments) => {
                    tracing::debug!(
                        "Generated {} assignments on attempt {} (auto_conflict={})",
                        assignments.len(),
                        attempt,
                        auto_conflict
                    );
                    return Ok(assignments);
                }
                Err(e) => tracing::trace!("Assignment attempt {} failed: {}", attempt, e),
            }
        }

        let message = format!(
            "Unable to generate assignments after {} attempts",
            self.max_attempts
        );
        Err(InvalidDataError::single(MessageKey::Failure, "generateAssignments", &message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const REPEAT: usize = 50;
    const MAX_ATTEMPTS: u32 = 100;

    fn participant(id: i64) -> Participant {
        Participant::new(id, &format!("name{}", id), &format!("nick{}", id), &format!("email{}", id))
    }

    fn assert_derangement(participants: &[Participant], assignments: &AssignmentSet) {
        assert_eq!(assignments.len(), participants.len());
        for p in participants {
            let receiver = assignments.gift_receiver(p).expect("every participant gives");
            let giver = assignments.gift_giver(p).expect("every participant receives");
            assert_ne!(receiver.id, p.id);
            assert_ne!(giver.id, p.id);
        }
    }

    #[test]
    fn test_zero_attempts_is_internal_error() {
        let generator = AssignmentGenerator::new(0);
        let participants = vec![participant(1), participant(2)];
        for auto_conflict in [false, true] {
            let result = generator.generate(&participants, auto_conflict);
            assert!(matches!(result, Err(ServiceError::Internal { .. })));
        }
    }

    #[test]
    fn test_single_participant_fails() {
        let generator = AssignmentGenerator::new(1);
        let result = generator.generate(&[participant(1)], false);
        assert!(matches!(result, Err(ServiceError::InvalidData(_))));
    }

    #[test]
    fn test_two_members() {
        let generator = AssignmentGenerator::new(1);
        let p1 = participant(1);
        let p2 = participant(2);
        let participants = vec![p1.clone(), p2.clone()];

        for _ in 0..REPEAT {
            // Only legal pairing is reciprocal, which auto-conflict forbids
            let result = generator.generate(&participants, true);
            match result {
                Err(ServiceError::InvalidData(e)) => {
                    assert_eq!(e.details.messages[0].key, MessageKey::Failure);
                    assert_eq!(e.message, "Unable to generate assignments after 1 attempts");
                }
                other => panic!("expected InvalidData, got {:?}", other),
            }
        }

        for _ in 0..REPEAT {
            let assignments = generator.generate(&participants, false).unwrap();
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments.gift_giver(&p2), Some(&p1));
            assert_eq!(assignments.gift_giver(&p1), Some(&p2));
        }
    }

    #[test]
    fn test_three_members_no_conflicts() {
        let generator = AssignmentGenerator::new(MAX_ATTEMPTS);
        let participants = vec![participant(1), participant(2), participant(3)];

        for auto_conflict in [false, true] {
            for _ in 0..REPEAT {
                let assignments = generator.generate(&participants, auto_conflict).unwrap();
                assert_derangement(&participants, &assignments);
            }
        }

        // Nobody gives to the person who gives to them
        for _ in 0..REPEAT {
            let assignments = generator.generate(&participants, true).unwrap();
            for p in &participants {
                assert_ne!(assignments.gift_giver(p), assignments.gift_receiver(p));
            }
        }
    }

    #[test]
    fn test_three_members_with_conflicts() {
        let generator = AssignmentGenerator::new(MAX_ATTEMPTS);
        let mut p1 = participant(1);
        let mut p2 = participant(2);
        let p3 = participant(3);
        p1.add_conflict(2);
        p2.add_conflict(3);
        let participants = vec![p1.clone(), p2.clone(), p3.clone()];

        for auto_conflict in [false, true] {
            for _ in 0..REPEAT {
                let assignments = generator.generate(&participants, auto_conflict).unwrap();
                assert_eq!(assignments.gift_receiver(&p1).and_then(|p| p.id), Some(3));
                assert_eq!(assignments.gift_receiver(&p2).and_then(|p| p.id), Some(1));
                assert_eq!(assignments.gift_receiver(&p3).and_then(|p| p.id), Some(2));
            }
        }
    }

    #[test]
    fn test_impossible_conflicts_fail() {
        let generator = AssignmentGenerator::new(10);
        let mut p1 = participant(1);
        p1.add_conflict(2);
        p1.add_conflict(3);
        let participants = vec![p1, participant(2), participant(3)];
        assert!(matches!(
            generator.generate(&participants, false),
            Err(ServiceError::InvalidData(_))
        ));
    }

    #[test]
    fn test_larger_exchange_is_derangement() {
        let generator = AssignmentGenerator::new(MAX_ATTEMPTS);
        let mut rng = StdRng::seed_from_u64(7);
        let participants: Vec<Participant> = (1..=12).map(participant).collect();

        for _ in 0..REPEAT {
            let assignments = generator
                .generate_with_rng(&participants, true, &mut rng)
                .unwrap();
            assert_derangement(&participants, &assignments);
            for p in &participants {
                assert_ne!(assignments.gift_giver(p), assignments.gift_receiver(p));
            }
        }
    }

    #[test]
    fn test_assign_once_reports_stuck_giver() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = assign_once(&[participant(5)], false, &mut rng);
        assert_eq!(result, Err(AttemptError::NoAllowableReceiver { giver: Some(5) }));
    }
}
