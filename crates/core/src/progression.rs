//! Pure progression predicates.
//!
//! These are consulted on every render pass and before any mutating action,
//! so they take references and have no side effects. Two asymmetric defaults
//! are deliberate, observed product behavior: a video with no surrounding
//! module data is unlockable (fail-open), while a module whose predecessor
//! has no videos stays locked (fail-closed).

use crate::model::{Module, VideoId};

/// Whether the learner may open the given video.
///
/// The first video of a module is always available; any later video requires
/// the immediately preceding video to be completed. A missing module or an
/// empty video list defaults to available (fail-open). A video id absent
/// from a non-empty list cannot establish its prerequisite and is locked.
#[must_use]
pub fn can_watch(video_id: &VideoId, module: Option<&Module>) -> bool {
    prerequisite_met(video_id, module)
}

/// Whether the given video's prerequisite chain permits marking it complete.
///
/// The check is identical to [`can_watch`]; it is kept as a separate entry
/// point because completion can be attempted from a context where the video
/// is not the one currently open. Watch-threshold and assessment gating are
/// layered on top by the engine.
#[must_use]
pub fn can_mark_complete(video_id: &VideoId, module: Option<&Module>) -> bool {
    prerequisite_met(video_id, module)
}

/// Whether the module at `index` is unlocked.
///
/// The first module is always available; any later module requires every
/// video of the preceding module to be completed. A missing or empty
/// preceding module cannot satisfy that and leaves the module locked.
#[must_use]
pub fn can_watch_module(index: usize, preceding: Option<&Module>) -> bool {
    if index == 0 {
        return true;
    }
    match preceding {
        Some(module) if !module.videos().is_empty() => module.completed(),
        _ => false,
    }
}

fn prerequisite_met(video_id: &VideoId, module: Option<&Module>) -> bool {
    let Some(module) = module else {
        return true;
    };
    if module.videos().is_empty() {
        return true;
    }
    match module.position_of(video_id) {
        Some(0) => true,
        Some(index) => module.videos()[index - 1].completed(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Module, ModuleId, Video, VideoId};

    fn video(id: &str, completed: bool) -> Video {
        Video::new(
            VideoId::new(id),
            ModuleId::new("m1"),
            format!("Video {id}"),
            None,
            completed,
            Vec::new(),
        )
    }

    fn module(videos: Vec<Video>) -> Module {
        Module::new(ModuleId::new("m1"), "Module 1", videos).unwrap()
    }

    #[test]
    fn first_video_is_always_watchable() {
        let m = module(vec![video("v1", false), video("v2", false)]);
        assert!(can_watch(&VideoId::new("v1"), Some(&m)));
    }

    #[test]
    fn second_video_unlocks_when_first_completes() {
        // Scenario A: locked until the predecessor is completed.
        let locked = module(vec![video("v1", false), video("v2", false)]);
        assert!(!can_watch(&VideoId::new("v2"), Some(&locked)));

        let unlocked = module(vec![video("v1", true), video("v2", false)]);
        assert!(can_watch(&VideoId::new("v2"), Some(&unlocked)));
    }

    #[test]
    fn prerequisite_chain_matches_predecessor_completion() {
        for completed in [false, true] {
            let m = module(vec![
                video("v1", true),
                video("v2", completed),
                video("v3", false),
            ]);
            assert_eq!(can_watch(&VideoId::new("v3"), Some(&m)), completed);
        }
    }

    #[test]
    fn missing_module_data_fails_open() {
        assert!(can_watch(&VideoId::new("v1"), None));
        let empty = module(Vec::new());
        assert!(can_watch(&VideoId::new("v1"), Some(&empty)));
    }

    #[test]
    fn unknown_video_in_populated_module_is_locked() {
        let m = module(vec![video("v1", true)]);
        assert!(!can_watch(&VideoId::new("v9"), Some(&m)));
    }

    #[test]
    fn mark_complete_uses_the_same_prerequisite() {
        let m = module(vec![video("v1", false), video("v2", false)]);
        assert!(can_mark_complete(&VideoId::new("v1"), Some(&m)));
        assert!(!can_mark_complete(&VideoId::new("v2"), Some(&m)));
        assert!(can_mark_complete(&VideoId::new("v1"), None));
    }

    #[test]
    fn first_module_is_always_unlocked() {
        assert!(can_watch_module(0, None));
    }

    #[test]
    fn module_unlocks_when_predecessor_fully_complete() {
        // Scenario B: module 2 locked until every video of module 1 completes.
        let partial = module(vec![video("v1", true), video("v2", false)]);
        assert!(!can_watch_module(1, Some(&partial)));

        let full = module(vec![video("v1", true), video("v2", true)]);
        assert!(can_watch_module(1, Some(&full)));
    }

    #[test]
    fn empty_preceding_module_fails_closed() {
        let empty = module(Vec::new());
        assert!(!can_watch_module(1, Some(&empty)));
        assert!(!can_watch_module(1, None));
    }
}
