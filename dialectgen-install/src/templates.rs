//! Built-in descriptor templates. Placeholders are `@NAME@`.

pub const CMAKE_CONFIG: &str = r#"# Generated by dialectgen; do not edit.
get_filename_component(_@PROJECT_NAME@_PREFIX "${CMAKE_CURRENT_LIST_DIR}/../../.." ABSOLUTE)

set(@PROJECT_NAME@_VERSION "@VERSION@")
set(@PROJECT_NAME@_VERSION_MAJOR @VERSION_MAJOR@)
set(@PROJECT_NAME@_VERSION_MINOR @VERSION_MINOR@)
set(@PROJECT_NAME@_VERSION_PATCH @VERSION_PATCH@)

set(@PROJECT_NAME@_INCLUDE_DIRS "${_@PROJECT_NAME@_PREFIX}/include/@PROJECT_NAME@")
set(@PROJECT_NAME@_DIALECTS_V10 "@DIALECTS_V1@")
set(@PROJECT_NAME@_DIALECTS_V20 "@DIALECTS_V2@")
set(@PROJECT_NAME@_LIBRARIES "@LIBRARIES@")
set(@PROJECT_NAME@_DEPENDENCIES "@DEPENDENCIES@")

if(NOT TARGET @PROJECT_NAME@::@PROJECT_NAME@)
  add_library(@PROJECT_NAME@::@PROJECT_NAME@ INTERFACE IMPORTED)
  set_target_properties(@PROJECT_NAME@::@PROJECT_NAME@ PROPERTIES
    INTERFACE_INCLUDE_DIRECTORIES "${@PROJECT_NAME@_INCLUDE_DIRS}")
endif()

set(@PROJECT_NAME@_FOUND TRUE)
"#;

pub const PKGCONFIG: &str = r#"prefix=@PREFIX@
includedir=${prefix}/include/@PROJECT_NAME@

Name: @PROJECT_NAME@
Description: Generated protocol headers (v1.0: @DIALECTS_V1@; v2.0: @DIALECTS_V2@)
Version: @VERSION@
Requires: @PKGCONFIG_REQUIRES@
Cflags: -I${includedir}
"#;
