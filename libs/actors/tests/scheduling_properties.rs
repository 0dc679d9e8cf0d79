//! Property tests over random interleavings of sends and drain passes

use cell_actors::{Actor, ActorSystem, Lane, MailboxSettings, ManualDispatcher, Result};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    Tell,
    System,
    RunPass,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Tell),
        1 => Just(Step::System),
        2 => Just(Step::RunPass),
    ]
}

struct Log(Arc<Mutex<Vec<(Lane, u32)>>>);

impl Actor for Log {
    type Message = u32;

    fn receive(&mut self, msg: u32) -> Result<()> {
        self.0.lock().push((Lane::User, msg));
        Ok(())
    }

    fn receive_system(&mut self, msg: u32) -> Result<()> {
        self.0.lock().push((Lane::System, msg));
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_every_message_delivered_once_in_lane_order(
        steps in prop::collection::vec(step(), 1..300),
        batch_size in 1usize..12,
    ) {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let system = ActorSystem::new(
            MailboxSettings::new(steps.len(), batch_size),
            dispatcher.clone(),
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let actor = system.actor_of(Log(Arc::clone(&log)));

        let mut sent_user = Vec::new();
        let mut sent_system = Vec::new();
        for (seq, step) in steps.iter().enumerate() {
            let seq = seq as u32;
            match step {
                Step::Tell => {
                    actor.tell(seq).unwrap();
                    sent_user.push(seq);
                }
                Step::System => {
                    actor.send_system_message(seq).unwrap();
                    sent_system.push(seq);
                }
                Step::RunPass => {
                    dispatcher.run_next();
                }
            }
            // At most one processing task is ever outstanding
            prop_assert!(dispatcher.pending() <= 1);
        }
        dispatcher.run_until_idle();

        let log = log.lock();
        let user: Vec<u32> = log.iter().filter(|(l, _)| *l == Lane::User).map(|(_, m)| *m).collect();
        let sys: Vec<u32> = log.iter().filter(|(l, _)| *l == Lane::System).map(|(_, m)| *m).collect();
        prop_assert_eq!(user, sent_user);
        prop_assert_eq!(sys, sent_system);

        let stats = actor.stats();
        prop_assert!(stats.largest_pass as usize <= batch_size);
        prop_assert_eq!(stats.delivered(), steps.iter().filter(|s| !matches!(s, Step::RunPass)).count() as u64);
        prop_assert!(actor.is_idle());
        prop_assert_eq!(actor.pending_messages(), 0);
    }

    #[test]
    fn prop_system_lane_drained_before_user_lane_within_pass(
        users in 0usize..40,
        systems in 1usize..20,
    ) {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let system = ActorSystem::new(MailboxSettings::new(64, 64), dispatcher.clone()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let actor = system.actor_of(Log(Arc::clone(&log)));

        for i in 0..users {
            actor.tell(i as u32).unwrap();
        }
        for i in 0..systems {
            actor.send_system_message(i as u32).unwrap();
        }
        prop_assert!(dispatcher.run_next());

        let log = log.lock();
        prop_assert_eq!(log.len(), users + systems);
        prop_assert!(log[..systems].iter().all(|(lane, _)| *lane == Lane::System));
        prop_assert!(log[systems..].iter().all(|(lane, _)| *lane == Lane::User));
    }
}
