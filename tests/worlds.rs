use actor_critic::env::{
    Env, GamblerConfig, GamblerEnv, GamblerState, HanoiConfig, HanoiEnv, HanoiMove,
};
use actor_critic::utils::shared_rng;
use actor_critic::RlError;

#[test]
fn sure_win_single_coin_bet() {
    let config = GamblerConfig {
        win_prob: 1.0,
        initial_coins: Some(50),
        ..GamblerConfig::default()
    };
    let mut env = GamblerEnv::new(config, shared_rng(Some(0)));
    assert_eq!(env.update(&1).unwrap(), 1.0);
    assert_eq!(
        env.get_current_state(),
        GamblerState {
            coins: 51,
            max_coins: 100
        }
    );
}

fn two_disc_hanoi() -> HanoiEnv {
    HanoiEnv::new(HanoiConfig {
        num_pegs: 3,
        num_discs: 2,
        ..HanoiConfig::default()
    })
}

#[test]
fn hanoi_starts_with_every_disc_on_the_first_peg() {
    let env = two_disc_hanoi();
    assert_eq!(env.get_current_state().pegs, vec![0, 0]);
    assert_eq!(env.state_size(), 6);
}

#[test]
fn hanoi_rejects_empty_source_and_self_moves() {
    let mut env = two_disc_hanoi();
    for mv in [HanoiMove::new(1, 2), HanoiMove::new(0, 0)] {
        assert!(!env.get_legal_actions(&env.get_current_state()).contains(&mv));
        assert!(matches!(env.update(&mv), Err(RlError::IllegalAction { .. })));
    }
    assert_eq!(env.get_current_state().pegs, vec![0, 0]);
}

#[test]
fn hanoi_move_only_changes_the_top_disc() {
    let mut env = two_disc_hanoi();
    env.update(&HanoiMove::new(0, 2)).unwrap();
    assert_eq!(env.get_current_state().pegs, vec![0, 2]);
    env.update(&HanoiMove::new(0, 1)).unwrap();
    assert_eq!(env.get_current_state().pegs, vec![1, 2]);
}
