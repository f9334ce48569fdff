// tests/provider_detect.rs
use job_harvester::detect::{career_page_base_url, detect, is_ats_url};
use job_harvester::Provider;

#[test]
fn detection_is_deterministic_for_known_providers() {
    assert_eq!(detect("https://boards.greenhouse.io/acme/jobs/123"), Provider::Greenhouse);
    assert_eq!(detect("https://jobs.lever.co/acme"), Provider::Lever);
    assert_eq!(detect("https://acme.wd5.myworkdayjobs.com/en-US/x"), Provider::Workday);
    assert_eq!(detect("https://linkedin.com/jobs/view/1"), Provider::Unknown);
}

#[test]
fn remaining_providers_detect_from_their_hosts() {
    assert_eq!(detect("https://careers-acme.icims.com/jobs/123"), Provider::Icims);
    assert_eq!(detect("https://acme.taleo.net/careersection/2/jobdetail.ftl"), Provider::Taleo);
    assert_eq!(detect("https://acme.bamboohr.com/jobs/view.php?id=1"), Provider::BambooHr);
    assert_eq!(detect("https://jobs.jobvite.com/acme/job/oX"), Provider::Jobvite);
    assert_eq!(detect("https://jobs.smartrecruiters.com/Acme/743"), Provider::SmartRecruiters);
    assert_eq!(detect("https://jobs.ashbyhq.com/acme/uuid"), Provider::Ashby);
}

#[test]
fn empty_and_unmatched_input_is_unknown() {
    assert_eq!(detect(""), Provider::Unknown);
    assert_eq!(detect("https://careers.acme.com/openings"), Provider::Unknown);
    assert!(!is_ats_url("https://careers.acme.com/openings"));
    assert!(is_ats_url("https://boards.greenhouse.io/acme"));
}

#[test]
fn base_url_comes_from_the_apply_url_host() {
    assert_eq!(
        career_page_base_url("https://jobs.lever.co/acme/ab-1/apply").as_deref(),
        Some("https://jobs.lever.co")
    );
    assert_eq!(career_page_base_url(""), None);
}
