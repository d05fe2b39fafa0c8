//! Utilities shared by solvers.

/// Clamps `r` to `[-clamp, clamp]` keeping its sign.
///
/// Returns `r` unchanged when `enabled` is `false`.
pub fn clip_reward(r: f64, enabled: bool, clamp: f64) -> f64 {
    if !enabled || r == 0.0 {
        return r;
    }
    r.signum() * r.abs().min(clamp)
}

/// Clamps `loss` to `[-clamp, clamp]`.
///
/// Returns `loss` unchanged when `enabled` is `false`.
pub fn clip_loss(loss: f64, enabled: bool, clamp: f64) -> f64 {
    if !enabled {
        return loss;
    }
    if loss > clamp {
        clamp
    } else if loss < -clamp {
        -clamp
    } else {
        loss
    }
}

/// Returns the index of the largest value, the first one on ties.
pub fn argmax(xs: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &x) in xs.iter().enumerate() {
        match best {
            Some((_, v)) if x <= v => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_reward_keeps_sign() {
        let clamp = 1.0;
        for &r in &[-100.0, -1.0, -0.3, 0.0, 0.3, 1.0, 1.0000001, 7.5] {
            let c = clip_reward(r, true, clamp);
            assert!((-clamp..=clamp).contains(&c), "{} -> {}", r, c);
            assert!(c.signum() == r.signum() || c == 0.0);
        }
        assert_eq!(clip_reward(-3.0, true, 2.0), -2.0);
        assert_eq!(clip_reward(0.5, true, 2.0), 0.5);
        assert_eq!(clip_reward(-3.0, false, 2.0), -3.0);
        assert_eq!(clip_reward(0.0, true, 2.0), 0.0);
    }

    #[test]
    fn test_clip_loss_bounds() {
        let clamp = 0.5;
        for &x in &[-10.0, -0.5, -0.1, 0.0, 0.1, 0.5, 10.0] {
            let c = clip_loss(x, true, clamp);
            assert!((-clamp..=clamp).contains(&c));
        }
        assert_eq!(clip_loss(0.5, true, 0.5), 0.5);
        assert_eq!(clip_loss(-0.5, true, 0.5), -0.5);
        assert_eq!(clip_loss(3.0, false, 0.5), 3.0);
    }

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, -1.0]), Some(1));
        assert_eq!(argmax(&[-2.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
