use chatsim::{
    AgendaUser, Annotation, DialogAct, Goal, GoalType, GoalValue, Profile, ScriptedRandom, UserGoal,
};

fn booking(goals: Vec<Goal>) -> UserGoal {
    UserGoal::new("movie", "booking", goals)
}

#[test]
fn quiet_verbose_user_opens_with_every_inform_in_goal_order() {
    let mut user = AgendaUser::with_random(15, ScriptedRandom::constant(0.5));
    let profile = Profile::new(0.0, 1.0, 1.0, 1.0, 0.0);
    let goal = booking(vec![Goal::fixed("date", "tomorrow"), Goal::fixed("time", "2 pm")]);

    user.initialize(profile, goal).unwrap();
    assert_eq!(user.agenda().len(), 2);

    let opening = user.start_conversation().unwrap();
    let acts: Vec<_> = opening.iter().map(|a| a.diagact).collect();
    assert_eq!(acts, vec![DialogAct::Inform, DialogAct::Inform]);
    assert_eq!(opening[0].goal_list[0].slot, "date");
    assert_eq!(opening[1].goal_list[0].slot, "time");
    assert!(user.agenda().is_empty());
}

#[test]
fn dont_care_slot_is_answered_with_an_options_request() {
    let mut user = AgendaUser::with_random(15, ScriptedRandom::constant(0.5));
    let profile = Profile::new(0.0, 0.0, 1.0, 1.0, 1.0);
    let goal = booking(vec![
        Goal::new("num_people", GoalValue::dont_care(), Some(GoalType::Open)),
        Goal::fixed("date", "tomorrow"),
    ]);

    user.initialize(profile, goal).unwrap();
    let opening = user.start_conversation().unwrap();
    assert_eq!(opening.len(), 1);
    assert!(opening[0].mentions_slot("date"));

    let request = Annotation::new(DialogAct::Request, "booking", "movie").with_goal(Goal::placeholder("num_people"));
    let turn = user.next(&[request], 2).unwrap();

    assert_eq!(turn.annotations.len(), 1);
    assert_eq!(turn.annotations[0].diagact, DialogAct::RequestAlts);
    assert!(turn.annotations[0].mentions_slot("num_people"));
    assert!(user.requested_option_slots().contains("num_people"));
    // the pending inform for the same slot was dropped
    assert!(user.agenda().is_empty());
    assert!(!turn.episode_over);
}

#[test]
fn goodbye_from_the_system_ends_the_episode() {
    let mut user = AgendaUser::with_random(15, ScriptedRandom::constant(0.5));
    user.initialize(Profile::new(0.0, 0.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
        .unwrap();
    user.start_conversation().unwrap();

    let turn = user
        .next(&[Annotation::new(DialogAct::Goodbye, "booking", "movie")], 2)
        .unwrap();
    assert!(turn.episode_over);
    assert!(!turn.failed);
    assert!(turn.annotations.is_empty());
}

#[test]
fn using_the_user_before_initialize_is_an_error() {
    let mut user = AgendaUser::with_random(15, ScriptedRandom::constant(0.5));
    assert!(matches!(
        user.start_conversation(),
        Err(chatsim::SimulationError::NotInitialized)
    ));
}
