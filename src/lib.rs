//! # Chore Quest Core
//!
//! An in-memory progression and chore bookkeeping library designed for FFI
//! (Foreign Function Interface) integration with dashboard front-ends.
//! Children complete chores, earn points, climb an achievement ladder and
//! claim the rewards attached to it; parents assign the chores and edit the
//! ladder.
//!
//! ## Features
//!
//! - **Pure progression engine**: unlock flags, next level and progress are
//!   recomputed from total points on every query ([`progression`])
//! - **Caller-owned state**: each session owns its data, no globals ([`session_state`])
//! - **One-way rewards**: rewards move from unclaimed to claimed exactly once
//! - **FFI-friendly**: JSON in, JSON out, every response wrapped in [`AppResponse`]
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use chore_quest_core::{create_session, add_user, get_progress, free_c_string};
//! use std::ffi::CString;
//!
//! let session = create_session(std::ptr::null());
//!
//! let child = CString::new(r#"{"id":"child-1","name":"Sam","role":"child","totalPoints":150}"#).unwrap();
//! free_c_string(add_user(session, child.as_ptr()));
//!
//! let user_id = CString::new("child-1").unwrap();
//! let progress = get_progress(session, user_id.as_ptr());
//! free_c_string(progress);
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_session`] / [`load_session`] - Initialize a session
//! - [`validate_config`] / [`validate_snapshot`] - Explain why a session would not start
//! - [`export_session`] - Serialize the whole session
//! - [`add_user`] / [`save_user`] / [`delete_user`] / [`set_total_points`] - Household members
//! - [`save_task`] / [`delete_task`] / [`complete_task`] - Chore bookkeeping
//! - [`get_levels`] / [`get_progress`] / [`save_level`] - Achievement ladder
//! - [`claim_reward`] / [`claim_level_reward`] - Reward lifecycle
//! - [`evaluate_progress`] - Stateless progress computation
//! - [`free_c_string`] / [`close_session`] - Memory management

pub mod achievement_model;
pub mod app_config;
pub mod app_response;
pub mod progression;
pub mod reward_model;
pub mod session_state;
pub mod task_model;
pub mod user_model;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::achievement_model::{AchievementDraft, AchievementLevel};
use crate::app_config::AppConfig;
use crate::app_response::AppResponse;
use crate::progression::{compute_unlocked, progress_snapshot, ProgressSnapshot};
use crate::session_state::{AppSessionState, SessionSnapshot};
use crate::task_model::TaskDraft;
use crate::user_model::User;

/// Creates a new session with the default achievement ladder.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`AppConfig`], or null for defaults
///
/// # Returns
///
/// A pointer to the new [`AppSessionState`], or null if the configuration is
/// invalid. Release it with [`close_session`].
///
/// A null return is explained by one `warn!` line: `Invalid UTF-8 in config
/// parameter` or `Rejected session config: <reason>`. Hosts that need the
/// reason as a value call [`validate_config`] with the same JSON.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use chore_quest_core::{create_session, close_session};
///
/// let config = CString::new(r#"{"levelCount":10,"pointsPerLevel":50}"#).unwrap();
/// let session = create_session(config.as_ptr());
/// assert!(!session.is_null());
/// close_session(session);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_session(config_json: *const c_char) -> *mut AppSessionState {
    let config = if config_json.is_null() {
        AppConfig::default()
    } else {
        let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid UTF-8 in config parameter: {e}");
                return std::ptr::null_mut();
            }
        };
        match AppConfig::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                warn!("Rejected session config: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    match AppSessionState::init(config) {
        Ok(state) => {
            info!("✅ Session created");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("❌ Failed to create session: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Creates a session from a JSON [`SessionSnapshot`], as produced by
/// [`export_session`].
///
/// Returns null if the pointer is null, the JSON is malformed, or the
/// snapshot breaks an invariant (duplicate ids, unordered level thresholds,
/// dangling reward links, tasks not assigned to a child).
///
/// The `warn!` line for a null return is `Null snapshot pointer passed to
/// load_session`, `Invalid UTF-8 in snapshot parameter` or `Failed to load
/// session: <reason>`. [`validate_snapshot`] returns the reason as a value.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_session(snapshot_json: *const c_char) -> *mut AppSessionState {
    if snapshot_json.is_null() {
        warn!("Null snapshot pointer passed to load_session");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(snapshot_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in snapshot parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let loaded = serde_json::from_str::<SessionSnapshot>(json)
        .map_err(AppResponse::from)
        .and_then(AppSessionState::from_snapshot);

    match loaded {
        Ok(state) => {
            info!("✅ Session loaded");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("❌ Failed to load session: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Checks a JSON [`AppConfig`] without creating a session.
///
/// The `Ok` payload is the config with defaults filled in. Rejections come
/// back as `ValidationError` or `SerializationError` with the same reason
/// [`create_session`] logs.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn validate_config(config_json: *const c_char) -> *const c_char {
    let json = match c_ptr_to_string(config_json, "config") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    json_response(AppConfig::from_json(&json))
}

/// Checks a JSON [`SessionSnapshot`] without keeping the session.
///
/// The `Ok` payload is a short summary of what would load; errors carry the
/// reason [`load_session`] would have logged.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn validate_snapshot(snapshot_json: *const c_char) -> *const c_char {
    let json = match c_ptr_to_string(snapshot_json, "snapshot") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let loaded = serde_json::from_str::<SessionSnapshot>(&json)
        .map_err(AppResponse::from)
        .and_then(AppSessionState::from_snapshot);

    match loaded {
        Ok(state) => response_to_c_string(&AppResponse::success(format!(
            "Snapshot is valid: {} users, {} tasks, {} levels, {} rewards",
            state.users().len(),
            state.tasks().len(),
            state.levels().len(),
            state.rewards().len()
        ))),
        Err(e) => response_to_c_string(&e),
    }
}

/// Serializes the whole session. The `Ok` payload is a [`SessionSnapshot`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_session(state: *mut AppSessionState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to export_session"),
    };
    json_response(Ok(state.snapshot()))
}

/// Registers a user. Expects a JSON [`User`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_user(state: *mut AppSessionState, json_ptr: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to add_user"),
    };

    let user: User = match parse_json(json_ptr, "JSON") {
        Ok(user) => user,
        Err(err) => return err,
    };

    json_response(state.add_user(user))
}

/// Creates or updates a user from a JSON [`User`].
///
/// An existing id updates name, age and points; a blank id creates a child
/// under a generated id. Changing a user's role is rejected.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_user(state: *mut AppSessionState, json_ptr: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to save_user"),
    };

    let user: User = match parse_json(json_ptr, "JSON") {
        Ok(user) => user,
        Err(err) => return err,
    };

    json_response(state.save_user(user))
}

/// Deletes a user and the tasks assigned to them. The `Ok` payload is a
/// [`session_state::UserRemoval`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_user(state: *mut AppSessionState, user_id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to delete_user"),
    };

    let user_id = match c_ptr_to_string(user_id, "user id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.delete_user(&user_id))
}

/// Overrides a child's point total.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_total_points(
    state: *mut AppSessionState,
    user_id: *const c_char,
    total_points: u64,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to set_total_points"),
    };

    let user_id = match c_ptr_to_string(user_id, "user id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.set_total_points(&user_id, total_points))
}

/// Creates or updates a task from a JSON [`TaskDraft`]. A draft without
/// `id` creates a new task due today unless `dueDate` says otherwise.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_task(state: *mut AppSessionState, json_ptr: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to save_task"),
    };

    let draft: TaskDraft = match parse_json(json_ptr, "JSON") {
        Ok(draft) => draft,
        Err(err) => return err,
    };

    json_response(state.save_task(draft, today()))
}

/// Deletes a task by id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_task(state: *mut AppSessionState, id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to delete_task"),
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    if state.delete_task(&id_str) {
        response_to_c_string(&AppResponse::success("Task deleted successfully"))
    } else {
        response_to_c_string(&AppResponse::not_found("task", &id_str))
    }
}

/// Completes a task and awards its points.
///
/// # Parameters
///
/// * `state` - Pointer to the session
/// * `task_id` - Null-terminated task id
/// * `date` - Null-terminated `YYYY-MM-DD` completion date, or null for today
///
/// The `Ok` payload is a [`session_state::TaskCompletion`] listing the levels
/// this completion unlocked.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn complete_task(
    state: *mut AppSessionState,
    task_id: *const c_char,
    date: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to complete_task"),
    };

    let task_id = match c_ptr_to_string(task_id, "task id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    let day = if date.is_null() {
        today()
    } else {
        let raw = match c_ptr_to_string(date, "date") {
            Ok(raw) => raw,
            Err(error_ptr) => return error_ptr,
        };
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(day) => day,
            Err(e) => return response_to_c_string(&AppResponse::from(e)),
        }
    };

    json_response(state.complete_task(&task_id, day))
}

/// Returns the ladder for a child, sorted by level, with `unlocked` computed
/// from the child's current total.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_levels(state: *mut AppSessionState, user_id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to get_levels"),
    };

    let user_id = match c_ptr_to_string(user_id, "user id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.levels_for(&user_id))
}

/// Returns a [`ProgressSnapshot`] for a child.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_progress(state: *mut AppSessionState, user_id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to get_progress"),
    };

    let user_id = match c_ptr_to_string(user_id, "user id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.progress_for(&user_id))
}

/// Creates or edits an achievement level from a JSON [`AchievementDraft`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_level(state: *mut AppSessionState, json_ptr: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to save_level"),
    };

    let draft: AchievementDraft = match parse_json(json_ptr, "JSON") {
        Ok(draft) => draft,
        Err(err) => return err,
    };

    json_response(state.save_level(draft))
}

/// Claims a reward by id. Claiming an already claimed reward succeeds.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn claim_reward(state: *mut AppSessionState, reward_id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to claim_reward"),
    };

    let reward_id = match c_ptr_to_string(reward_id, "reward id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.claim_reward(&reward_id))
}

/// Claims the reward linked to an achievement level the child has unlocked.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn claim_level_reward(
    state: *mut AppSessionState,
    user_id: *const c_char,
    level_id: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to claim_level_reward"),
    };

    let user_id = match c_ptr_to_string(user_id, "user id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    let level_id = match c_ptr_to_string(level_id, "level id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    json_response(state.claim_level_reward(&user_id, &level_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateRequest {
    levels: Vec<AchievementLevel>,
    #[serde(default)]
    total_points: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResult {
    levels: Vec<AchievementLevel>,
    progress: ProgressSnapshot,
}

/// Stateless progression query.
///
/// Expects `{"levels": [...], "totalPoints": n}` and answers with the levels
/// carrying computed `unlocked` flags plus a [`ProgressSnapshot`]. The levels
/// are not validated; callers own the ordering invariant.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn evaluate_progress(json_ptr: *const c_char) -> *const c_char {
    let request: EvaluateRequest = match parse_json(json_ptr, "JSON") {
        Ok(request) => request,
        Err(err) => return err,
    };

    let result = EvaluateResult {
        levels: compute_unlocked(&request.levels, request.total_points),
        progress: progress_snapshot(&request.levels, request.total_points),
    };
    json_response(Ok(result))
}

/// Releases a string returned by any function in this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

/// Releases a session created by [`create_session`] or [`load_session`].
/// The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_session(state: *mut AppSessionState) -> *const c_char {
    if state.is_null() {
        return bad_request("Null state pointer passed to close_session");
    }

    unsafe {
        drop(Box::from_raw(state));
    }
    info!("Session closed");
    response_to_c_string(&AppResponse::success("Session closed successfully"))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Wraps a serializable result: `Ok(value)` becomes `AppResponse::Ok` with
/// the value's JSON, errors pass through unchanged.
fn json_response<T: Serialize>(result: Result<T, AppResponse>) -> *const c_char {
    let response = result
        .and_then(|value| serde_json::to_string(&value).map_err(AppResponse::from))
        .map(AppResponse::Ok)
        .unwrap_or_else(|err| err);
    response_to_c_string(&response)
}

fn bad_request(msg: &str) -> *const c_char {
    response_to_c_string(&AppResponse::BadRequest(msg.to_string()))
}

fn parse_json<T: for<'de> Deserialize<'de>>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char> {
    let json_str = c_ptr_to_string(ptr, field_name)?;
    serde_json::from_str(&json_str).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns a pointer to a null-terminated JSON string, or null if
/// serialization fails. The caller frees it with [`free_c_string`].
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - `BadRequest` response for null pointers or invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
