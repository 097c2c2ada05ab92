//! Steps shared by several scenarios

use crate::errors::AutomationError;
use crate::names;
use crate::selector::Selector;
use crate::session::Session;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// True unless the plugin error overview shows up during the startup grace
/// period. A plugin error is recorded as fatal and its dialog closed.
#[instrument(skip_all)]
pub async fn started_without_plugin_error(session: &Session) -> bool {
    let grace = Duration::from_millis(session.config().startup_grace_ms);
    let overview = match session.locator(names::PLUGIN_ERRORS_DIALOG) {
        Ok(locator) => locator,
        Err(e) => {
            session.outcomes().record_error("Resolving the plugin error dialog", &e);
            return false;
        }
    };
    if overview.wait(Some(grace)).await.is_err() {
        debug!(?grace, "no plugin errors");
        return true;
    }
    let detail = match session
        .wait_for_object(names::PLUGIN_ERROR_TEXT, Some(Duration::from_secs(1)))
        .await
    {
        Ok(text) => text.text().unwrap_or_default(),
        Err(e) => e.to_string(),
    };
    // the scenario body is skipped rather than aborted
    session.outcomes().fatal(
        "Could not perform clean start of the IDE - plugin error occurred.",
        Some(&detail),
    );
    if let Err(e) = session.click_button(names::PLUGIN_ERRORS_CLOSE).await {
        session.outcomes().record_error("Closing the plugin error dialog", &e);
    }
    false
}

/// Opens *File → New Project...* and picks `template` below `category`
#[instrument(skip(session))]
pub async fn create_project_or_file_select_type(
    session: &Session,
    category: &str,
    template: &str,
) -> Result<(), AutomationError> {
    session.invoke_menu_item("File", &["New Project..."]).await?;
    session.wait_for_object(names::NEW_DIALOG, None).await?;

    let category_item = Selector::builder()
        .type_name("QModelIndex")
        .text(category)
        .container(session.selector(names::NEW_CATEGORIES_VIEW)?)
        .build()?;
    session.locator_for(category_item).wait(None).await?.click()?;

    let template_item = Selector::builder()
        .type_name("QModelIndex")
        .text(template)
        .visible(true)
        .container(session.selector(names::NEW_TEMPLATES_VIEW)?)
        .build()?;
    session.locator_for(template_item).wait(None).await?.click()?;

    session.click_button(names::NEW_DIALOG_CHOOSE).await?;
    info!(category = category.trim(), template, "wizard chosen");
    Ok(())
}

/// Makes the Version Control output pane the visible one
pub async fn open_vcs_log(session: &Session) -> Result<(), AutomationError> {
    if !session.object_exists(names::VCS_PANE_LABEL) {
        session
            .invoke_menu_item("View", &["Output Panes", "Version Control"])
            .await?;
    }
    session.wait_for_object(names::VCS_PANE_LABEL, None).await?;
    Ok(())
}

/// Makes the Application Output pane the visible one
pub async fn open_application_output(session: &Session) -> Result<(), AutomationError> {
    session
        .invoke_menu_item("View", &["Output Panes", "Application Output"])
        .await
}

/// Dismisses the repository completion popup.
///
/// The popup has no close button and covers the fields below the URL, so
/// this clicks the empty page area halfway between the bottom of the
/// *Recursive* checkbox and the bottom of the page.
pub async fn close_proposal_popup(session: &Session) -> Result<(), AutomationError> {
    let page = session.wait_for_object(names::WIZARD_FIELD_PAGE, None).await?;
    let checkbox = session.wait_for_object(names::RECURSIVE_CHECKBOX, None).await?;
    let (_, _, width, height) = page.bounds()?;
    let (_, check_y, _, check_height) = checkbox.bounds()?;
    page.click_at(width / 2.0, (height + check_y + check_height) / 2.0)?;
    let popup = session.locator(names::PROPOSAL_POPUP)?;
    session
        .wait_for(Some(Duration::from_secs(2)), || Ok(!popup.exists()))
        .await
        .into_result("proposal popup closing")?;
    Ok(())
}

/// Selects `item` in the named combo box
pub async fn select_combo_item(session: &Session, name: &str, item: &str) -> Result<(), AutomationError> {
    let combo = session.wait_for_object(name, None).await?;
    session.replace_editor_content(&combo, item)
}
