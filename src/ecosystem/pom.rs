//! Streaming decoder for the parts of a Maven POM that name artifacts.

use crate::types::{Result, ScanError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// groupId / artifactId / version triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub id: String,
    pub dependencies: Vec<Coordinate>,
    pub plugins: Vec<Coordinate>,
}

/// Decoded `<project>`.
#[derive(Debug, Clone, Default)]
pub struct PomProject {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub parent: Option<Coordinate>,
    /// Free-form `<properties>` children, element name to text.
    pub properties: HashMap<String, String>,
    pub dependencies: Vec<Coordinate>,
    pub managed_dependencies: Vec<Coordinate>,
    pub plugins: Vec<Coordinate>,
    pub profiles: Vec<Profile>,
}

/// Element paths whose children are a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Parent,
    Dependency,
    ManagedDependency,
    Plugin,
    ProfileDependency,
    ProfilePlugin,
}

impl Section {
    fn at(path: &[String]) -> Option<Self> {
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        match path.as_slice() {
            ["project", "parent"] => Some(Section::Parent),
            ["project", "dependencies", "dependency"] => Some(Section::Dependency),
            ["project", "dependencyManagement", "dependencies", "dependency"] => Some(Section::ManagedDependency),
            ["project", "build", "plugins", "plugin"] => Some(Section::Plugin),
            ["project", "profiles", "profile", "dependencies", "dependency"] => Some(Section::ProfileDependency),
            ["project", "profiles", "profile", "build", "plugins", "plugin"] => Some(Section::ProfilePlugin),
            _ => None,
        }
    }
}

/// Coordinate being filled, with the depth of its container element.
struct OpenCoordinate {
    section: Section,
    depth: usize,
    coordinate: Coordinate,
}

impl PomProject {
    fn add(&mut self, section: Section, coordinate: Coordinate) {
        match section {
            Section::Parent => self.parent = Some(coordinate),
            Section::Dependency => self.dependencies.push(coordinate),
            Section::ManagedDependency => self.managed_dependencies.push(coordinate),
            Section::Plugin => self.plugins.push(coordinate),
            Section::ProfileDependency => self.current_profile().dependencies.push(coordinate),
            Section::ProfilePlugin => self.current_profile().plugins.push(coordinate),
        }
    }

    fn current_profile(&mut self) -> &mut Profile {
        if self.profiles.is_empty() {
            self.profiles.push(Profile::default());
        }
        let last = self.profiles.len() - 1;
        &mut self.profiles[last]
    }

    /// Leaf values outside of coordinate sections.
    fn record(&mut self, path: &[String], value: String) {
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        match path.as_slice() {
            ["project", "groupId"] => self.group_id = value,
            ["project", "artifactId"] => self.artifact_id = value,
            ["project", "version"] => self.version = value,
            ["project", "properties", key] => {
                self.properties.insert(key.to_string(), value);
            }
            ["project", "profiles", "profile", "id"] => self.current_profile().id = value,
            _ => {}
        }
    }

    /// Value of a `${...}` placeholder key.
    pub fn property(&self, key: &str) -> Option<&str> {
        let parent = self.parent.as_ref();
        let value = match key {
            "project.groupId" | "pom.groupId" | "groupId" => {
                if self.group_id.is_empty() {
                    parent.map(|p| p.group_id.as_str())
                } else {
                    Some(self.group_id.as_str())
                }
            }
            "project.artifactId" | "pom.artifactId" => Some(self.artifact_id.as_str()),
            "project.version" | "pom.version" | "version" => {
                if self.version.is_empty() {
                    parent.map(|p| p.version.as_str())
                } else {
                    Some(self.version.as_str())
                }
            }
            "project.parent.groupId" | "parent.groupId" => parent.map(|p| p.group_id.as_str()),
            "project.parent.version" | "parent.version" => parent.map(|p| p.version.as_str()),
            _ => self.properties.get(key).map(String::as_str),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Decode a POM document.
///
/// # Errors
///
/// Any XML syntax error, a root element other than `<project>`, or a
/// document that ends with unclosed elements.
pub fn parse_pom(xml: &str) -> Result<PomProject> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut project = PomProject::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut open: Option<OpenCoordinate> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if path.is_empty() {
                    if seen_root || name != "project" {
                        return Err(ScanError::PomError(format!("unexpected root element <{}>", name)));
                    }
                    seen_root = true;
                } else if name == "profile" && path.len() == 2 && path[1] == "profiles" {
                    project.profiles.push(Profile::default());
                }

                path.push(name);
                text.clear();

                if open.is_none() {
                    if let Some(section) = Section::at(&path) {
                        open = Some(OpenCoordinate {
                            section,
                            depth: path.len(),
                            coordinate: Coordinate::default(),
                        });
                    }
                }
            }
            Event::Empty(element) => {
                if path.is_empty() {
                    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                    if name != "project" || seen_root {
                        return Err(ScanError::PomError(format!("unexpected root element <{}>", name)));
                    }
                    seen_root = true;
                }
            }
            Event::Text(content) => text.push_str(&content.unescape()?),
            Event::CData(content) => text.push_str(&String::from_utf8_lossy(&content.into_inner())),
            Event::End(_) => {
                let value = text.trim().to_string();
                text.clear();

                match open.as_ref().map(|current| current.depth) {
                    Some(depth) if path.len() == depth + 1 => {
                        if let Some(current) = open.as_mut() {
                            match path.last().map(String::as_str) {
                                Some("groupId") => current.coordinate.group_id = value,
                                Some("artifactId") => current.coordinate.artifact_id = value,
                                Some("version") => current.coordinate.version = value,
                                _ => {}
                            }
                        }
                    }
                    Some(depth) if path.len() == depth => {
                        if let Some(finished) = open.take() {
                            project.add(finished.section, finished.coordinate);
                        }
                    }
                    Some(_) => {}
                    None => project.record(&path, value),
                }

                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(ScanError::PomError("missing <project> root element".to_string()));
    }
    if !path.is_empty() {
        return Err(ScanError::PomError(format!("unclosed element <{}>", path.join(">"))));
    }

    Ok(project)
}
