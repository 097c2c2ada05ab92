//! Built-in object map for the IDE objects the scenarios touch

use crate::object_map::ObjectMap;
use once_cell::sync::Lazy;
use tracing::error;

pub const MAIN_WINDOW: &str = ":Qt Creator_Core::Internal::MainWindow";
pub const PLUGIN_ERRORS_DIALOG: &str =
    ":Qt Creator - Plugin loader messages_ExtensionSystem::Internal::PluginErrorOverview";
pub const PLUGIN_ERROR_TEXT: &str = ":Qt Creator - Plugin loader messages.pluginError_QTextEdit";
pub const PLUGIN_ERRORS_CLOSE: &str = ":Qt Creator - Plugin loader messages.Close_QPushButton";
pub const NEW_DIALOG: &str = ":New_Core::Internal::NewDialog";
pub const NEW_DIALOG_CHOOSE: &str = ":New.Choose..._QPushButton";
pub const NEW_CATEGORIES_VIEW: &str = ":New.categoriesView_QTreeView";
pub const NEW_TEMPLATES_VIEW: &str = ":New.templatesView_QListView";
pub const NEW_WIZARD: &str = ":New_ProjectExplorer::JsonWizard";
pub const WIZARD_FIELD_PAGE: &str = ":JsonWizard_ProjectExplorer::JsonFieldPage";
pub const WIZARD_NEXT: &str = ":Next_QPushButton";
pub const WIZARD_FINISH: &str = ":Finish_QPushButton";
pub const RECURSIVE_CHECKBOX: &str = ":Recursive_QCheckBox";
pub const REPO_EDIT: &str = ":Repo_QLineEdit";
pub const WORKING_COPY_EDIT: &str = ":Working Copy_Utils::BaseValidatingLineEdit";
pub const CLONE_DIR_EDIT: &str = ":Dir_QLineEdit";
pub const PROPOSAL_POPUP: &str = ":Proposal_QListView";

pub const CLONE_WIZARD: &str = ":Git Repository Clone_ProjectExplorer::JsonWizard";
pub const CLONE_LOG: &str = ":Git Repository Clone.logPlainTextEdit_QPlainTextEdit";
pub const CLONE_RESULT_LABEL: &str = ":Git Repository Clone.Result._QLabel";
pub const CLONE_CANCEL: &str = ":Git Repository Clone.Cancel_QPushButton";
pub const CLONE_FINISH: &str = ":Git Repository Clone.Finish_QPushButton";

pub const OUTPUT_PANE: &str = ":Qt Creator_Core::OutputWindow";
pub const VCS_PANE_LABEL: &str = ":Qt Creator.Version Control_QLabel";
pub const OUTPUT_CLEAR: &str = ":*Qt Creator.Clear_QToolButton";
pub const CONFIGURE_PROJECT: &str = ":Qt Creator.Configure Project_QPushButton";
pub const CANNOT_OPEN_PROJECT: &str = ":Cannot Open Project_QMessageBox";
pub const CANNOT_OPEN_DETAILS: &str = ":Cannot Open Project.Show Details..._QPushButton";
pub const CANNOT_OPEN_TEXT: &str = ":Cannot Open Project_QTextEdit";
pub const CANNOT_OPEN_OK: &str = ":Cannot Open Project.OK_QPushButton";

pub const PROJECT_NAME_EDIT: &str = ":New.Name_QLineEdit";
pub const PROJECT_PATH_EDIT: &str = ":New.Path_Utils::FancyLineEdit";
pub const BUILD_SYSTEM_COMBO: &str = ":New.BuildSystem_QComboBox";
pub const BUILD_CONFIG_COMBO: &str = ":Qt Creator.BuildConfiguration_QComboBox";
pub const BUILD_BUTTON: &str = ":*Qt Creator.Build Project_Core::Internal::FancyToolButton";
pub const RUN_BUTTON: &str = ":*Qt Creator.Run_Core::Internal::FancyToolButton";
pub const BUILD_PROGRESS: &str = ":Qt Creator.BuildProgress_QLabel";
pub const ISSUES_COUNT: &str = ":Qt Creator.Issues_QLabel";

const BUILTIN: &str = r#"
# main window
:Qt Creator_Core::Internal::MainWindow	{type='Core::Internal::MainWindow' visible='1'}
:Qt Creator - Plugin loader messages_ExtensionSystem::Internal::PluginErrorOverview	{name='pluginErrorOverview' type='ExtensionSystem::Internal::PluginErrorOverview' visible='1' windowTitle='Qt Creator - Plugin loader messages'}
:Qt Creator - Plugin loader messages.pluginError_QTextEdit	{name='pluginError' type='QTextEdit' visible='1' window=':Qt Creator - Plugin loader messages_ExtensionSystem::Internal::PluginErrorOverview'}
:Qt Creator - Plugin loader messages.Close_QPushButton	{text='Close' type='QPushButton' unnamed='1' visible='1' window=':Qt Creator - Plugin loader messages_ExtensionSystem::Internal::PluginErrorOverview'}
:Qt Creator_Core::OutputWindow	{type='Core::OutputWindow' unnamed='1' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:Qt Creator.Version Control_QLabel	{text='Version Control' type='QLabel' unnamed='1' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:*Qt Creator.Clear_QToolButton	{text='Clear' type='QToolButton' unnamed='1' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:Qt Creator.Configure Project_QPushButton	{text='Configure Project' type='QPushButton' unnamed='1' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:Qt Creator.BuildConfiguration_QComboBox	{name='buildConfiguration' type='QComboBox' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:*Qt Creator.Build Project_Core::Internal::FancyToolButton	{text='Build Project' type='Core::Internal::FancyToolButton' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:*Qt Creator.Run_Core::Internal::FancyToolButton	{text='Run' type='Core::Internal::FancyToolButton' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:Qt Creator.BuildProgress_QLabel	{name='buildProgress' type='QLabel' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}
:Qt Creator.Issues_QLabel	{name='issuesCount' type='QLabel' visible='1' window=':Qt Creator_Core::Internal::MainWindow'}

# new dialog
:New_Core::Internal::NewDialog	{type='Core::Internal::NewDialog' unnamed='1' visible='1'}
:New.Choose..._QPushButton	{text='Choose...' type='QPushButton' unnamed='1' visible='1' window=':New_Core::Internal::NewDialog'}
:New.categoriesView_QTreeView	{name='categoriesView' type='QTreeView' visible='1' window=':New_Core::Internal::NewDialog'}
:New.templatesView_QListView	{name='templatesView' type='QListView' visible='1' window=':New_Core::Internal::NewDialog'}
:New_ProjectExplorer::JsonWizard	{type='ProjectExplorer::JsonWizard' unnamed='1' visible='1'}
:JsonWizard_ProjectExplorer::JsonFieldPage	{type='ProjectExplorer::JsonFieldPage' unnamed='1' visible='1'}
:Next_QPushButton	{text='Next >' type='QPushButton' visible='1'}
:Finish_QPushButton	{text='Finish' type='QPushButton' visible='1'}
:New.Name_QLineEdit	{name='ProjectName' type='QLineEdit' visible='1' window=':New_ProjectExplorer::JsonWizard'}
:New.Path_Utils::FancyLineEdit	{name='ProjectPath' type='Utils::FancyLineEdit' visible='1' window=':New_ProjectExplorer::JsonWizard'}
:New.BuildSystem_QComboBox	{name='BuildSystem' type='QComboBox' visible='1' window=':New_ProjectExplorer::JsonWizard'}

# git clone wizard
:Repo_QLineEdit	{name='Repo' type='QLineEdit' visible='1'}
:Dir_QLineEdit	{name='Dir' type='QLineEdit' visible='1'}
:Working Copy_Utils::BaseValidatingLineEdit	{name='WorkingCopy' type='Utils::BaseValidatingLineEdit' visible='1'}
:Recursive_QCheckBox	{text='Recursive' type='QCheckBox' unnamed='1' visible='1'}
:Proposal_QListView	{name='proposalPopup' type='QListView' visible='1'}
:Git Repository Clone_ProjectExplorer::JsonWizard	{type='ProjectExplorer::JsonWizard' unnamed='1' visible='1' windowTitle='Git Repository Clone'}
:Git Repository Clone.logPlainTextEdit_QPlainTextEdit	{name='logPlainTextEdit' type='QPlainTextEdit' visible='1' window=':Git Repository Clone_ProjectExplorer::JsonWizard'}
:Git Repository Clone.Result._QLabel	{name='statusLabel' type='QLabel' visible='1' window=':Git Repository Clone_ProjectExplorer::JsonWizard'}
:Git Repository Clone.Cancel_QPushButton	{text='Cancel' type='QPushButton' visible='1' window=':Git Repository Clone_ProjectExplorer::JsonWizard'}
:Git Repository Clone.Finish_QPushButton	{text='Finish' type='QPushButton' visible='1' window=':Git Repository Clone_ProjectExplorer::JsonWizard'}

# project loading
:Cannot Open Project_QMessageBox	{type='QMessageBox' unnamed='1' visible='1' windowTitle='Cannot Open Project'}
:Cannot Open Project.Show Details..._QPushButton	{text='Show Details...' type='QPushButton' unnamed='1' visible='1' window=':Cannot Open Project_QMessageBox'}
:Cannot Open Project_QTextEdit	{type='QTextEdit' unnamed='1' visible='1' window=':Cannot Open Project_QMessageBox'}
:Cannot Open Project.OK_QPushButton	{text='OK' type='QPushButton' unnamed='1' visible='1' window=':Cannot Open Project_QMessageBox'}
"#;

static BUILTIN_MAP: Lazy<ObjectMap> = Lazy::new(|| match ObjectMap::parse(BUILTIN) {
    Ok(map) => map,
    Err(e) => {
        error!(error = %e, "built-in object map is malformed, starting empty");
        ObjectMap::default()
    }
});

/// Object map with every symbolic name defined in this module
pub fn builtin() -> ObjectMap {
    BUILTIN_MAP.clone()
}
