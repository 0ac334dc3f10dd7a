use serde::{Deserialize, Serialize};

/// How a question is answered: `Rating` takes exactly one option,
/// `MultiSelect` takes zero or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    Rating,
    MultiSelect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCategory {
    pub category: String,
    pub questions: Vec<SurveyQuestion>,
}

fn question(text: &str, kind: QuestionKind, options: &[&str]) -> SurveyQuestion {
    SurveyQuestion {
        text: text.to_string(),
        kind,
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn category(name: &str, questions: Vec<SurveyQuestion>) -> SurveyCategory {
    SurveyCategory {
        category: name.to_string(),
        questions,
    }
}

/// The static survey definition. Question texts double as the join key
/// for stored answers, so they must stay stable once responses exist.
pub fn survey_catalog() -> Vec<SurveyCategory> {
    use QuestionKind::{MultiSelect, Rating};

    vec![
        category(
            "Technical Workflows",
            vec![
                question(
                    "How efficient are your current development workflows?",
                    Rating,
                    &[
                        "Extremely inefficient",
                        "Somewhat inefficient",
                        "Neutral",
                        "Somewhat efficient",
                        "Extremely efficient",
                    ],
                ),
                question(
                    "Which areas slow down your development process the most?",
                    MultiSelect,
                    &[
                        "Code Review Bottlenecks",
                        "Unclear Requirements",
                        "Outdated Documentation",
                        "Inefficient Testing",
                        "Deployment Complexity",
                        "Legacy Code Maintenance",
                        "Lack of Automation",
                        "Limited Access to Resources",
                        "Inadequate Version Control Practices",
                    ],
                ),
                question(
                    "How efficient are our current development workflows?",
                    Rating,
                    &[
                        "Very inefficient",
                        "Somewhat inefficient",
                        "Neutral",
                        "Somewhat efficient",
                        "Very efficient",
                    ],
                ),
                question(
                    "Select top 3 technical pain points:",
                    MultiSelect,
                    &[
                        "Slow CI/CD pipelines",
                        "Flaky tests",
                        "Poor documentation",
                        "Complex deployments",
                        "Legacy code challenges",
                        "Environment inconsistencies",
                        "Tooling limitations",
                        "Code review bottlenecks",
                    ],
                ),
            ],
        ),
        category(
            "Professional Growth",
            vec![
                question(
                    "What skills would you most like to develop?",
                    MultiSelect,
                    &[
                        "Advanced Backend Techniques",
                        "Frontend Framework Mastery",
                        "Cloud Architecture",
                        "DevOps Practices",
                        "System Design",
                        "Machine Learning Integration",
                        "Data Engineering",
                        "Blockchain Technologies",
                        "Security Best Practices",
                    ],
                ),
                question(
                    "How supported do you feel in your professional development?",
                    Rating,
                    &[
                        "Not supported at all",
                        "Slightly supported",
                        "Moderately supported",
                        "Very supported",
                        "Extremely supported",
                    ],
                ),
                question(
                    "How satisfied are you with current growth opportunities?",
                    Rating,
                    &[
                        "Very dissatisfied",
                        "Somewhat dissatisfied",
                        "Neutral",
                        "Somewhat satisfied",
                        "Very satisfied",
                    ],
                ),
                question(
                    "Which skills do you want to develop?",
                    MultiSelect,
                    &[
                        "Cloud architecture",
                        "System design",
                        "DevOps practices",
                        "Performance optimization",
                        "Security engineering",
                        "Technical leadership",
                        "Data engineering",
                        "AI/ML applications",
                    ],
                ),
                question(
                    "What type of training would benefit you most?",
                    MultiSelect,
                    &[
                        "Hands-on workshops",
                        "Conference attendance",
                        "Certification programs",
                        "Mentorship pairings",
                        "Brown bag sessions",
                        "Online courses",
                        "Project rotations",
                    ],
                ),
            ],
        ),
        category(
            "Team Dynamics",
            vec![
                question(
                    "How would you rate team communication?",
                    Rating,
                    &["Very Poor", "Poor", "Average", "Good", "Excellent"],
                ),
                question(
                    "What communication channels need improvement?",
                    MultiSelect,
                    &[
                        "Daily Stand-ups",
                        "Slack/Messaging",
                        "Email",
                        "Documentation",
                        "Sprint Planning",
                        "Retrospectives",
                        "One-on-one Meetings",
                        "Team-building Activities",
                    ],
                ),
                question(
                    "How effective is team communication?",
                    Rating,
                    &[
                        "Very ineffective",
                        "Somewhat ineffective",
                        "Neutral",
                        "Somewhat effective",
                        "Very effective",
                    ],
                ),
                question(
                    "Which collaboration aspects need improvement?",
                    MultiSelect,
                    &[
                        "Daily stand-ups",
                        "Sprint planning",
                        "Retrospectives",
                        "Knowledge sharing",
                        "Cross-team coordination",
                        "Documentation practices",
                        "Decision transparency",
                    ],
                ),
            ],
        ),
        category(
            "Leadership Feedback",
            vec![
                question(
                    "How effective is leadership communication?",
                    Rating,
                    &[
                        "Very ineffective",
                        "Somewhat ineffective",
                        "Neutral",
                        "Somewhat effective",
                        "Very effective",
                    ],
                ),
                question(
                    "What leadership qualities should we develop?",
                    MultiSelect,
                    &[
                        "Technical vision",
                        "Decision speed",
                        "Transparency",
                        "Mentorship",
                        "Stakeholder management",
                        "Removing blockers",
                        "Recognizing contributions",
                    ],
                ),
            ],
        ),
        category(
            "Work-Life Balance",
            vec![
                question(
                    "How would you rate your current work-life balance?",
                    Rating,
                    &["Extremely Poor", "Poor", "Neutral", "Good", "Extremely Good"],
                ),
                question(
                    "What contributes most to your stress at work?",
                    MultiSelect,
                    &[
                        "Tight Deadlines",
                        "Excessive Meetings",
                        "Unclear Expectations",
                        "Lack of Autonomy",
                        "Technical Debt",
                        "Constant Context Switching",
                        "Inadequate Resources",
                        "Poor Management",
                    ],
                ),
            ],
        ),
        category(
            "Tools and Infrastructure",
            vec![
                question(
                    "How satisfied are you with your current development tools?",
                    Rating,
                    &[
                        "Very Dissatisfied",
                        "Dissatisfied",
                        "Neutral",
                        "Satisfied",
                        "Very Satisfied",
                    ],
                ),
                question(
                    "Which tools would you like to see improved or introduced?",
                    MultiSelect,
                    &[
                        "IDE",
                        "Version Control",
                        "Continuous Integration",
                        "Deployment Tools",
                        "Monitoring Systems",
                        "Collaboration Platforms",
                        "Code Quality Tools",
                        "Project Management Software",
                    ],
                ),
                question(
                    "How satisfied are you with our development tools?",
                    Rating,
                    &[
                        "Very dissatisfied",
                        "Somewhat dissatisfied",
                        "Neutral",
                        "Somewhat satisfied",
                        "Very satisfied",
                    ],
                ),
                question(
                    "Which tools need immediate attention?",
                    MultiSelect,
                    &[
                        "IDEs/editors",
                        "Version control",
                        "CI/CD systems",
                        "Testing frameworks",
                        "Monitoring tools",
                        "Debugging utilities",
                        "Documentation systems",
                        "Project management",
                    ],
                ),
            ],
        ),
        category(
            "Career Aspirations",
            vec![
                question(
                    "What is your primary career goal in the next 2-3 years?",
                    MultiSelect,
                    &[
                        "Technical Leadership",
                        "Become a Specialist",
                        "Move to Management",
                        "Start a Startup",
                        "Transition to a Different Tech Domain",
                        "Improve Technical Skills",
                        "Work on Cutting-edge Technologies",
                    ],
                ),
                question(
                    "How clear is your career path here?",
                    Rating,
                    &[
                        "Very unclear",
                        "Somewhat unclear",
                        "Neutral",
                        "Somewhat clear",
                        "Very clear",
                    ],
                ),
                question(
                    "What career aspects matter most?",
                    MultiSelect,
                    &[
                        "Technical challenges",
                        "Leadership opportunities",
                        "Compensation growth",
                        "Work-life balance",
                        "Learning opportunities",
                        "Project impact",
                        "Company stability",
                    ],
                ),
            ],
        ),
        category(
            "Final Thoughts",
            vec![
                question(
                    "Overall, how satisfied are you with your current role?",
                    Rating,
                    &[
                        "Extremely Dissatisfied",
                        "Dissatisfied",
                        "Neutral",
                        "Satisfied",
                        "Extremely Satisfied",
                    ],
                ),
                question(
                    "How likely are you to recommend working here?",
                    Rating,
                    &[
                        "Not likely at all",
                        "Slightly unlikely",
                        "Neutral",
                        "Somewhat likely",
                        "Extremely likely",
                    ],
                ),
            ],
        ),
    ]
}

pub fn find_question<'a>(
    catalog: &'a [SurveyCategory],
    text: &str,
) -> Option<&'a SurveyQuestion> {
    catalog
        .iter()
        .flat_map(|cat| cat.questions.iter())
        .find(|q| q.text == text)
}
